//! Order lifecycle
//!
//! ```text
//! ongoing ──▶ completed   (completedAt stamped once)
//!    │
//!    └──────▶ cancelled
//! ```
//!
//! Admins see and act on every branch; billers only on their own. Every write
//! is persisted first, then announced to `branch:<code>` and `admins`. A
//! failed announcement is logged and never fails the request.

use chrono_tz::Tz;
use serde::Deserialize;
use shared::models::{Order, OrderCreate, OrderStatus, PaymentMode, Role};
use shared::realtime::RealtimeEvent;
use shared::{AppError, AppResult, ErrorCode};
use std::sync::Arc;

use super::items::normalize_items;
use super::store::{NewOrder, OrderStore};
use crate::auth::CurrentUser;
use crate::db::repository::order::OrderFilter;
use crate::realtime::{RealtimePublisher, Room};
use crate::security_log;
use crate::utils::time::{day_window, parse_date};

/// What an actor may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Branch(String),
}

impl Scope {
    pub fn of(actor: &CurrentUser) -> AppResult<Self> {
        match (&actor.role, actor.branch_code.as_deref()) {
            (Role::Admin, _) => Ok(Self::All),
            (Role::Biller, Some(code)) if !code.is_empty() => Ok(Self::Branch(code.to_string())),
            (Role::Biller, _) => Err(AppError::forbidden("Biller has no branch assigned")),
            (Role::Unknown, _) => Err(AppError::forbidden("Access denied")),
        }
    }

    pub fn allows(&self, branch_code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Branch(own) => own == branch_code,
        }
    }
}

/// Query string of `GET /api/orders`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub status: Option<String>,
    /// `YYYY-MM-DD`, business timezone
    pub date: Option<String>,
    /// Admin only; billers are always pinned to their own branch
    pub branch_code: Option<String>,
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.trim().parse::<OrderStatus>().map_err(|e| {
        AppError::new(ErrorCode::InvalidOrderStatus).with_detail("status", e.0)
    })
}

fn deny(actor: &CurrentUser, branch_code: &str, action: &str) -> AppError {
    security_log!(
        "WARN",
        "branch_access_denied",
        user_id = actor.id,
        branch_code = branch_code,
        action = action
    );
    AppError::branch_access_denied()
}

pub struct OrderController {
    store: Arc<dyn OrderStore>,
    publisher: Arc<dyn RealtimePublisher>,
    tz: Tz,
}

impl OrderController {
    pub fn new(store: Arc<dyn OrderStore>, publisher: Arc<dyn RealtimePublisher>, tz: Tz) -> Self {
        Self {
            store,
            publisher,
            tz,
        }
    }

    pub async fn create(&self, actor: &CurrentUser, req: OrderCreate) -> AppResult<Order> {
        let scope = Scope::of(actor)?;

        let branch_code = req
            .branch_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string);
        let Some(branch_code) = branch_code.filter(|_| !req.items.is_empty()) else {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        };
        let Some(payment_mode) = req.payment_mode.as_deref() else {
            return Err(AppError::required("paymentMode"));
        };
        let Some(total_amount) = req.total_amount else {
            return Err(AppError::required("totalAmount"));
        };

        if !scope.allows(&branch_code) {
            return Err(deny(actor, &branch_code, "create_order"));
        }

        let items = normalize_items(&req.items)?;
        let payment_mode = payment_mode.trim().parse::<PaymentMode>().map_err(|e| {
            AppError::with_message(ErrorCode::InvalidPaymentMode, e)
                .with_detail("field", "paymentMode")
        })?;
        if !total_amount.is_finite() || total_amount < 0.0 {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "totalAmount must be a number >= 0",
            )
            .with_detail("field", "totalAmount"));
        }

        let order = self
            .store
            .create(NewOrder {
                branch_code,
                items,
                total_amount,
                payment_mode,
                created_by: actor.id,
            })
            .await?;

        tracing::info!(
            order_id = %order.order_id,
            branch_code = %order.branch_code,
            created_by = actor.id,
            total_amount = order.total_amount,
            "Order created"
        );

        self.notify(RealtimeEvent::OrderCreated(order.clone()));
        Ok(order)
    }

    pub async fn list(&self, actor: &CurrentUser, query: &OrderListQuery) -> AppResult<Vec<Order>> {
        let scope = Scope::of(actor)?;

        let mut filter = OrderFilter {
            status: query.status.as_deref().map(parse_status).transpose()?,
            ..Default::default()
        };
        if let Some(date) = query.date.as_deref() {
            let (from, to) = day_window(parse_date(date)?, self.tz);
            filter.created_from = Some(from);
            filter.created_to = Some(to);
        }
        filter.branch_code = match scope {
            Scope::All => query
                .branch_code
                .as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
            Scope::Branch(own) => Some(own),
        };

        Ok(self.store.list(&filter).await?)
    }

    pub async fn list_ongoing(&self, actor: &CurrentUser) -> AppResult<Vec<Order>> {
        let query = OrderListQuery {
            status: Some(OrderStatus::Ongoing.as_str().to_string()),
            ..Default::default()
        };
        self.list(actor, &query).await
    }

    pub async fn list_by_date(&self, actor: &CurrentUser, date: &str) -> AppResult<Vec<Order>> {
        let query = OrderListQuery {
            date: Some(date.to_string()),
            ..Default::default()
        };
        self.list(actor, &query).await
    }

    pub async fn get(&self, actor: &CurrentUser, order_id: &str) -> AppResult<Order> {
        let scope = Scope::of(actor)?;
        let order = self.find(order_id).await?;
        if !scope.allows(&order.branch_code) {
            return Err(deny(actor, &order.branch_code, "get_order"));
        }
        Ok(order)
    }

    pub async fn update_status(
        &self,
        actor: &CurrentUser,
        order_id: &str,
        status: Option<&str>,
    ) -> AppResult<Order> {
        let scope = Scope::of(actor)?;
        let target = match status {
            Some(raw) => parse_status(raw)?,
            None => return Err(AppError::required("status")),
        };

        let order = self.find(order_id).await?;
        if !scope.allows(&order.branch_code) {
            return Err(deny(actor, &order.branch_code, "update_order_status"));
        }

        if order.status == target {
            return Ok(order);
        }
        if order.status.is_terminal() || !target.is_terminal() {
            return Err(terminal(&order, target));
        }

        if !self.store.close(order_id, target).await? {
            // Lost a race against another transition
            let current = self.find(order_id).await?;
            if current.status == target {
                return Ok(current);
            }
            return Err(terminal(&current, target));
        }

        let updated = self.find(order_id).await?;
        tracing::info!(
            order_id = %updated.order_id,
            branch_code = %updated.branch_code,
            from = %order.status,
            to = %updated.status,
            user_id = actor.id,
            "Order status updated"
        );

        self.notify(RealtimeEvent::OrderUpdated(updated.clone()));
        Ok(updated)
    }

    async fn find(&self, order_id: &str) -> AppResult<Order> {
        self.store
            .find(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id))
    }

    fn notify(&self, event: RealtimeEvent) {
        let rooms = Room::for_order(&event.order().branch_code);
        match self.publisher.broadcast(&rooms, &event) {
            Ok(delivered) => tracing::debug!(
                order_id = %event.order().order_id,
                delivered = delivered,
                "Order event published"
            ),
            Err(e) => tracing::warn!(
                order_id = %event.order().order_id,
                error = %e,
                "Failed to publish order event"
            ),
        }
    }
}

fn terminal(order: &Order, target: OrderStatus) -> AppError {
    AppError::with_message(
        ErrorCode::OrderStatusTerminal,
        format!(
            "Order {} is {} and cannot become {}",
            order.order_id, order.status, target
        ),
    )
    .with_detail("status", order.status.as_str())
}
