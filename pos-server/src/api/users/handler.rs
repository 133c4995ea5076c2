//! User API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::api::email_conflict;
use crate::auth::{CurrentUser, hash_password};
use crate::core::ServerState;
use crate::db::repository::{RepoError, user};
use crate::security_log;
use crate::utils::validation::{
    MAX_NAME_LEN, validate_branch_code, validate_email, validate_password, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{Role, User, UserCreate, UserUpdate};

/// List all users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let users = user::find_all(&state.pool).await?;
    Ok(Json(users))
}

/// Create an admin or a biller
pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    ensure_known_role(&payload.role)?;

    let branch_code = non_empty(payload.branch_code);
    if let Some(code) = &branch_code {
        validate_branch_code(code)?;
    }
    if payload.role == Role::Biller && branch_code.is_none() {
        return Err(AppError::new(ErrorCode::BillerBranchRequired));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    let created = user::create(
        &state.pool,
        user::NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash,
            role: payload.role,
            branch_code,
        },
        state.now_millis(),
    )
    .await
    .map_err(email_conflict)?;

    security_log!(
        "INFO",
        "user_created",
        actor_id = actor.id,
        user_id = created.id,
        role = created.role.as_str()
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user; the password is re-hashed when present
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Extension(actor): Extension<CurrentUser>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    let existing = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    if let Some(role) = &payload.role {
        ensure_known_role(role)?;
    }

    // Empty string clears the branch
    let branch_change = payload.branch_code.map(|code| non_empty(Some(code)));
    if let Some(Some(code)) = &branch_change {
        validate_branch_code(code)?;
    }

    let role = payload.role.clone().unwrap_or_else(|| existing.role.clone());
    let branch_after = match &branch_change {
        Some(change) => change.clone(),
        None => existing.branch_code.clone(),
    };
    if role == Role::Biller && branch_after.is_none() {
        return Err(AppError::new(ErrorCode::BillerBranchRequired));
    }

    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(password)?;
            Some(
                hash_password(password)
                    .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?,
            )
        }
        None => None,
    };

    let updated = user::update(
        &state.pool,
        id,
        user::UserChanges {
            name: payload.name.map(|n| n.trim().to_string()),
            email: payload.email.map(|e| e.trim().to_string()),
            password_hash,
            role: payload.role,
            branch_code: branch_change,
        },
        state.now_millis(),
    )
    .await
    .map_err(|e| match e {
        RepoError::NotFound(_) => AppError::new(ErrorCode::UserNotFound),
        other => email_conflict(other),
    })?;

    security_log!("INFO", "user_updated", actor_id = actor.id, user_id = id);
    Ok(Json(updated))
}

/// Delete a user; admins cannot delete their own account
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Extension(actor): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    if actor.id == id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf));
    }
    if !user::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }

    security_log!("INFO", "user_deleted", actor_id = actor.id, user_id = id);
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

fn ensure_known_role(role: &Role) -> AppResult<()> {
    if matches!(role, Role::Unknown) {
        return Err(AppError::invalid_field("role", "must be admin or biller"));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
