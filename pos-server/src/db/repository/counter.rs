//! Order Counter Repository
//!
//! One row per `order_{branchCode}_{YYYYMMDD}` key, created on first use.

use super::RepoResult;
use sqlx::Sqlite;

/// Atomically increment the counter for `key` and return the new value
///
/// Single statement upsert: a missing row is created with `seq = 1`, an
/// existing one is bumped in place. SQLite serializes writers, so concurrent
/// callers on the same key always observe distinct values.
pub async fn increment(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    key: &str,
    now: i64,
) -> RepoResult<i64> {
    let seq = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_counter (id, seq, updated_at) VALUES (?1, 1, ?2) \
         ON CONFLICT(id) DO UPDATE SET seq = seq + 1, updated_at = excluded.updated_at \
         RETURNING seq",
    )
    .bind(key)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    #[tokio::test]
    async fn test_increment_starts_at_one() {
        let (pool, _dir) = test_pool().await;
        assert_eq!(increment(&pool, "order_BR01_20250614", 1).await.unwrap(), 1);
        assert_eq!(increment(&pool, "order_BR01_20250614", 2).await.unwrap(), 2);

        let stored: i64 = sqlx::query_scalar("SELECT seq FROM order_counter WHERE id = ?")
            .bind("order_BR01_20250614")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (pool, _dir) = test_pool().await;
        increment(&pool, "order_BR01_20250614", 1).await.unwrap();
        increment(&pool, "order_BR01_20250614", 1).await.unwrap();
        assert_eq!(increment(&pool, "order_BR02_20250614", 1).await.unwrap(), 1);
        assert_eq!(increment(&pool, "order_BR01_20250615", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_contiguous() {
        let (pool, _dir) = test_pool().await;

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move { increment(&pool, "order_BR01_20250614", i).await })
            })
            .collect();

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort_unstable();
        assert_eq!(values, (1..=40).collect::<Vec<i64>>());
    }
}
