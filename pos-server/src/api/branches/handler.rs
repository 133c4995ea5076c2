//! Branch API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::core::ServerState;
use crate::db::repository::{RepoError, branch};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, validate_branch_code, validate_optional_text,
    validate_printer_ip, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{Branch, BranchCreate, BranchUpdate};

/// List all branches
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Branch>>> {
    let branches = branch::find_all(&state.pool).await?;
    Ok(Json(branches))
}

/// Create a branch
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BranchCreate>,
) -> AppResult<(StatusCode, Json<Branch>)> {
    let payload = BranchCreate {
        name: payload.name.trim().to_string(),
        branch_code: payload.branch_code.trim().to_string(),
        address: payload.address.trim().to_string(),
        printer_ip: payload
            .printer_ip
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty()),
    };

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_branch_code(&payload.branch_code)?;
    if payload.address.len() > MAX_ADDRESS_LEN {
        return Err(AppError::invalid_field("address", "is too long"));
    }
    if let Some(ip) = &payload.printer_ip {
        validate_printer_ip(ip)?;
    }

    let created = branch::create(&state.pool, payload, state.now_millis())
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::BranchCodeExists),
            other => other.into(),
        })?;

    tracing::info!(branch_code = %created.branch_code, "Branch created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update name, address or printer; an empty `printerIP` clears the printer
pub async fn update(
    State(state): State<ServerState>,
    Path(branch_code): Path<String>,
    Json(payload): Json<BranchUpdate>,
) -> AppResult<Json<Branch>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    if let Some(ip) = payload.printer_ip.as_deref().filter(|ip| !ip.trim().is_empty()) {
        validate_printer_ip(ip)?;
    }

    let payload = BranchUpdate {
        name: payload.name.map(|n| n.trim().to_string()),
        address: payload.address.map(|a| a.trim().to_string()),
        printer_ip: payload.printer_ip.map(|ip| ip.trim().to_string()),
    };

    let updated = branch::update(&state.pool, &branch_code, payload, state.now_millis())
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => AppError::new(ErrorCode::BranchNotFound),
            other => other.into(),
        })?;

    tracing::info!(branch_code = %updated.branch_code, "Branch updated");
    Ok(Json(updated))
}
