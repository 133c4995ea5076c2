//! Order API Module
//!
//! Thin HTTP layer over [`OrderController`](crate::orders::OrderController);
//! branch scoping and validation live in the controller.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 静态路径先于 /{id} 注册
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/ongoing", get(handler::list_ongoing))
        .route("/by-date/{date}", get(handler::list_by_date))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
}
