//! Printer API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/printer/print | POST | 打印小票 |
//! | /api/printer/reprint | POST | 补打小票 |
//!
//! 打印机不可达时返回 202 和 `warning`，订单本身不受影响。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/printer/print", post(handler::print))
        .route("/api/printer/reprint", post(handler::reprint))
}
