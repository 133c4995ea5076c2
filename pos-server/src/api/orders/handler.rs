//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::OrderListQuery;
use crate::utils::AppResult;
use shared::models::{Order, OrderCreate, OrderStatusUpdate};

/// Create an order (201)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.list(&user, &query).await?;
    Ok(Json(orders))
}

pub async fn list_ongoing(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.list_ongoing(&user).await?;
    Ok(Json(orders))
}

/// Orders created on one business day (`YYYY-MM-DD`)
pub async fn list_by_date(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(date): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.list_by_date(&user, &date).await?;
    Ok(Json(orders))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get(&user, &id).await?;
    Ok(Json(order))
}

/// Transition an order's status
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let order = state
        .orders
        .update_status(&user, &id, payload.status.as_deref())
        .await?;
    Ok(Json(order))
}
