//! Order persistence seam
//!
//! The controller talks to [`OrderStore`]; [`SqliteOrderStore`] assigns IDs
//! through the [`OrderSequence`] and writes through the order repository. The
//! counter bump and the insert share one transaction.

use async_trait::async_trait;
use shared::models::{Order, OrderItem, OrderStatus, PaymentMode};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::sequence::OrderSequence;
use crate::db::repository::order::{self, OrderFilter};
use crate::db::repository::RepoResult;
use crate::utils::time::Clock;

/// Validated input for a new order
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub branch_code: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub payment_mode: PaymentMode,
    pub created_by: i64,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Assign an ID and persist as `ongoing`
    async fn create(&self, new: NewOrder) -> RepoResult<Order>;

    async fn find(&self, order_id: &str) -> RepoResult<Option<Order>>;

    /// Newest first
    async fn list(&self, filter: &OrderFilter) -> RepoResult<Vec<Order>>;

    /// Move an `ongoing` order into a terminal status; `false` when the order
    /// was no longer ongoing
    async fn close(&self, order_id: &str, status: OrderStatus) -> RepoResult<bool>;
}

pub struct SqliteOrderStore {
    pool: SqlitePool,
    sequence: OrderSequence,
    clock: Arc<dyn Clock>,
}

impl SqliteOrderStore {
    pub fn new(pool: SqlitePool, sequence: OrderSequence, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            sequence,
            clock,
        }
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn create(&self, new: NewOrder) -> RepoResult<Order> {
        let now = self.clock.now_millis();
        let mut tx = self.pool.begin().await?;
        let order_id = self
            .sequence
            .next_order_id_at(&mut tx, &new.branch_code, now)
            .await?;

        let order = Order {
            order_id,
            branch_code: new.branch_code,
            items: new.items,
            total_amount: new.total_amount,
            payment_mode: new.payment_mode,
            status: OrderStatus::Ongoing,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        order::insert(&mut *tx, &order).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn find(&self, order_id: &str) -> RepoResult<Option<Order>> {
        order::find_by_id(&self.pool, order_id).await
    }

    async fn list(&self, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
        order::find_all(&self.pool, filter).await
    }

    async fn close(&self, order_id: &str, status: OrderStatus) -> RepoResult<bool> {
        order::close(&self.pool, order_id, status, self.clock.now_millis()).await
    }
}
