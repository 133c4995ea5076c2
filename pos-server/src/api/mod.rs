//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录、首个管理员注册、当前用户
//! - [`users`] - 用户管理 (管理员)
//! - [`branches`] - 门店管理 (管理员)
//! - [`orders`] - 订单生命周期
//! - [`printer`] - 小票打印 / 补打

pub mod auth;
pub mod branches;
pub mod health;
pub mod orders;
pub mod printer;
pub mod users;

use std::any::Any;

use axum::response::{IntoResponse, Response};
use axum::{Router, middleware};
use http::HeaderValue;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::{Config, ServerState};
use crate::db::repository::RepoError;
use crate::utils::{AppError, ErrorCode};

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// panic 统一转换为 500，细节只进日志
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::internal(format!("Handler panicked: {detail}")).into_response()
}

/// 邮箱重复 → 409 EmailExists
pub(crate) fn email_conflict(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::EmailExists),
        other => other.into(),
    }
}

/// CORS: 未配置 CORS_ORIGIN 时允许任意来源
fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origin) = config.cors_origin.as_deref() else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin),
        Err(_) => {
            tracing::warn!(origin = %origin, "Invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// 所有路由 (无中间件、无状态)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(branches::router())
        .merge(orders::router())
        .merge(printer::router())
        .merge(crate::realtime::ws::router())
}

/// 完整应用：路由 + 认证 + Tower HTTP 中间件
///
/// HTTP 服务器和集成测试共用
pub fn build_app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config);

    build_router()
        // JWT 认证中间件 - require_auth 内部会跳过公共路由
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // 最外层：捕获 panic
        .layer(CatchPanicLayer::custom(handle_panic))
}
