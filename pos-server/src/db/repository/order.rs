//! Order Repository

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderStatus};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const ORDER_COLUMNS: &str = "order_id, branch_code, items, total_amount, payment_mode, status, \
     created_by, created_at, updated_at, completed_at";

/// List filter; every field is optional and combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub branch_code: Option<String>,
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<i64>,
    /// Inclusive upper bound on `created_at`
    pub created_to: Option<i64>,
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order: &Order,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (order_id, branch_code, items, total_amount, payment_mode, status, \
         created_by, created_at, updated_at, completed_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order.order_id)
    .bind(&order.branch_code)
    .bind(Json(&order.items))
    .bind(order.total_amount)
    .bind(order.payment_mode)
    .bind(order.status)
    .bind(order.created_by)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("Order {}", order.order_id)),
        other => other,
    })?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, order_id: &str) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

/// Orders matching `filter`, newest first
pub async fn find_all(pool: &SqlitePool, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

    if let Some(branch_code) = &filter.branch_code {
        qb.push(" AND branch_code = ").push_bind(branch_code.clone());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    qb.push(" ORDER BY created_at DESC, order_id DESC");

    let orders = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok(orders)
}

/// Move an ongoing order into a terminal status
///
/// Conditional on the row still being `ongoing`, so of several racing
/// transitions exactly one applies; `completed_at` is stamped only when the
/// target is `completed`. Returns whether this call applied the transition.
pub async fn close(
    pool: &SqlitePool,
    order_id: &str,
    status: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    if !status.is_terminal() {
        return Err(RepoError::Validation(format!(
            "Cannot close order into status {status}"
        )));
    }

    let completed_at = (status == OrderStatus::Completed).then_some(now);
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2, completed_at = COALESCE(?3, completed_at) \
         WHERE order_id = ?4 AND status = 'ongoing'",
    )
    .bind(status)
    .bind(now)
    .bind(completed_at)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use shared::models::{Addon, OrderItem, PaymentMode};

    fn order(id: &str, branch: &str, created_at: i64) -> Order {
        Order {
            order_id: id.into(),
            branch_code: branch.into(),
            items: vec![OrderItem {
                menu_item_id: Some("m-chai".into()),
                item_name: "Chai".into(),
                quantity: 2,
                price: 20.0,
                addons: vec![Addon {
                    name: "Ginger".into(),
                    price: 5.0,
                }],
            }],
            total_amount: 50.0,
            payment_mode: PaymentMode::Cash,
            status: OrderStatus::Ongoing,
            created_by: 42,
            created_at,
            updated_at: created_at,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip_items() {
        let (pool, _dir) = test_pool().await;
        let o = order("BR01-20250614-0001", "BR01", 100);
        insert(&pool, &o).await.unwrap();

        let found = find_by_id(&pool, "BR01-20250614-0001").await.unwrap().unwrap();
        assert_eq!(found, o);
        assert!(find_by_id(&pool, "BR01-20250614-0002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let (pool, _dir) = test_pool().await;
        let o = order("BR01-20250614-0001", "BR01", 100);
        insert(&pool, &o).await.unwrap();
        assert!(matches!(
            insert(&pool, &o).await,
            Err(RepoError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_find_all_filters_and_orders_newest_first() {
        let (pool, _dir) = test_pool().await;
        insert(&pool, &order("BR01-20250614-0001", "BR01", 100)).await.unwrap();
        insert(&pool, &order("BR02-20250614-0001", "BR02", 200)).await.unwrap();
        insert(&pool, &order("BR01-20250614-0002", "BR01", 300)).await.unwrap();

        let all = find_all(&pool, &OrderFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(
            ids,
            ["BR01-20250614-0002", "BR02-20250614-0001", "BR01-20250614-0001"]
        );

        let br01 = find_all(
            &pool,
            &OrderFilter {
                branch_code: Some("BR01".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(br01.len(), 2);

        let window = find_all(
            &pool,
            &OrderFilter {
                created_from: Some(200),
                created_to: Some(300),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(window.len(), 2);
    }

    #[tokio::test]
    async fn test_close_applies_once() {
        let (pool, _dir) = test_pool().await;
        insert(&pool, &order("BR01-20250614-0001", "BR01", 100)).await.unwrap();

        assert!(close(&pool, "BR01-20250614-0001", OrderStatus::Completed, 500).await.unwrap());
        assert!(!close(&pool, "BR01-20250614-0001", OrderStatus::Completed, 900).await.unwrap());
        assert!(!close(&pool, "BR01-20250614-0001", OrderStatus::Cancelled, 900).await.unwrap());

        let found = find_by_id(&pool, "BR01-20250614-0001").await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Completed);
        assert_eq!(found.completed_at, Some(500));
        assert_eq!(found.updated_at, 500);

        let filtered = find_all(
            &pool,
            &OrderFilter {
                status: Some(OrderStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_never_sets_completed_at() {
        let (pool, _dir) = test_pool().await;
        insert(&pool, &order("BR01-20250614-0001", "BR01", 100)).await.unwrap();

        assert!(close(&pool, "BR01-20250614-0001", OrderStatus::Cancelled, 500).await.unwrap());
        let found = find_by_id(&pool, "BR01-20250614-0001").await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Cancelled);
        assert_eq!(found.completed_at, None);
    }

    #[tokio::test]
    async fn test_close_rejects_ongoing_target() {
        let (pool, _dir) = test_pool().await;
        assert!(matches!(
            close(&pool, "x", OrderStatus::Ongoing, 1).await,
            Err(RepoError::Validation(_))
        ));
    }
}
