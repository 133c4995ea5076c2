//! Printer API Handlers

use axum::{Json, extract::State, http::StatusCode};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::printing::{PrintKind, PrintReport, PrintRequest};
use crate::utils::AppResult;

pub async fn print(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PrintRequest>,
) -> AppResult<(StatusCode, Json<PrintReport>)> {
    run(&state, &user, PrintKind::Print, payload).await
}

pub async fn reprint(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PrintRequest>,
) -> AppResult<(StatusCode, Json<PrintReport>)> {
    run(&state, &user, PrintKind::Reprint, payload).await
}

/// 200 when the printer took the receipt, 202 when delivery failed
async fn run(
    state: &ServerState,
    user: &CurrentUser,
    kind: PrintKind,
    payload: PrintRequest,
) -> AppResult<(StatusCode, Json<PrintReport>)> {
    let report = state.printing.print(user, kind, payload).await?;
    let status = if report.is_degraded() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}
