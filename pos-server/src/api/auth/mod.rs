//! Authentication Routes

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// Build authentication router
/// - /api/auth/login, /api/auth/register-admin: public (skipped by require_auth)
/// - /api/auth/me: any authenticated user
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/register-admin", post(handler::register_admin))
        .route("/api/auth/me", get(handler::me))
}
