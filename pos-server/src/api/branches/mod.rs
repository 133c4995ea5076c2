//! Branch API Module
//!
//! Branches carry the receipt printer address used by the print flow.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Branch router (admin only)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/branches", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{branch_code}", put(handler::update))
        .layer(middleware::from_fn(require_admin))
}
