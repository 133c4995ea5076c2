//! Order ID sequence
//!
//! Order IDs read `{branchCode}-{YYYYMMDD}-{seq}` where the date is the
//! business-timezone day of creation and `seq` restarts at 1 for every
//! (branch, day) pair. The counter lives in storage, so IDs stay unique across
//! restarts and across concurrent requests.
//!
//! The counter is bumped on the caller's connection. Inside a transaction the
//! bump rolls back together with whatever failed after it, so a failed insert
//! never leaves a hole in the day's numbering.

use chrono_tz::Tz;
use sqlx::SqliteConnection;
use std::sync::Arc;

use crate::db::repository::{RepoResult, counter};
use crate::utils::time::{Clock, date_key};

/// Sequence values from this point on no longer fit in four digits
pub const SEQ_WIDTH_LIMIT: i64 = 10_000;

/// Counter key for one branch and business day
pub fn counter_key(branch_code: &str, date_key: &str) -> String {
    format!("order_{}_{}", branch_code, date_key)
}

/// `BR01`, `20250614`, `7` → `BR01-20250614-0007`
pub fn format_order_id(branch_code: &str, date_key: &str, seq: i64) -> String {
    format!("{}-{}-{:04}", branch_code, date_key, seq)
}

/// Issues order IDs
#[derive(Clone)]
pub struct OrderSequence {
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl std::fmt::Debug for OrderSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSequence")
            .field("clock", &self.clock)
            .field("tz", &self.tz)
            .finish()
    }
}

impl OrderSequence {
    pub fn new(clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self { clock, tz }
    }

    /// Next ID for `branch_code`, dated by the clock's current instant
    pub async fn next_order_id(
        &self,
        conn: &mut SqliteConnection,
        branch_code: &str,
    ) -> RepoResult<String> {
        self.next_order_id_at(conn, branch_code, self.clock.now_millis())
            .await
    }

    /// Next ID for `branch_code`, dated by `now`
    pub async fn next_order_id_at(
        &self,
        conn: &mut SqliteConnection,
        branch_code: &str,
        now: i64,
    ) -> RepoResult<String> {
        let day = date_key(now, self.tz);
        let key = counter_key(branch_code, &day);
        let seq = counter::increment(&mut *conn, &key, now).await?;

        if seq >= SEQ_WIDTH_LIMIT {
            tracing::warn!(
                branch_code = %branch_code,
                date = %day,
                seq = seq,
                "Order sequence exceeded four digits"
            );
        }

        Ok(format_order_id(branch_code, &day, seq))
    }
}
