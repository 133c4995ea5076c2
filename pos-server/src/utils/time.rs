//! 时间工具函数 — 业务时区转换
//!
//! 所有"自然日"边界 (订单号日期段、按日查询窗口、列表 `date` 过滤)
//! 统一使用配置的业务时区计算；repository 层只接收 `i64` Unix millis。

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 默认业务时区
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// 可注入时钟，测试中可固定到午夜前后
pub trait Clock: Send + Sync + fmt::Debug {
    /// 当前 Unix millis
    fn now_millis(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

/// 固定时钟 (测试用)，可通过 [`FixedClock::set`] 拨动
#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }

    /// 从 RFC 3339 字符串创建，解析失败时落在 epoch
    pub fn at(rfc3339: &str) -> Self {
        let millis = DateTime::parse_from_rfc3339(rfc3339)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0);
        Self::new(millis)
    }

    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// 解析时区名称 (IANA)，失败时回退到默认时区
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(
            "Unknown timezone '{}', falling back to {}",
            name,
            DEFAULT_TIMEZONE
        );
        DEFAULT_TIMEZONE
    })
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::with_message(
            shared::ErrorCode::InvalidFormat,
            format!("Invalid date format: {}", date),
        )
        .with_detail("field", "date")
    })
}

/// Unix millis → 业务时区的日历日
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&tz)
        .date_naive()
}

/// Unix millis → `YYYYMMDD` (业务时区)
pub fn date_key(millis: i64, tz: Tz) -> String {
    local_date(millis, tz).format("%Y%m%d").to_string()
}

/// 日期 00:00:00 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地零点不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期的闭区间窗口 `[00:00:00.000, 23:59:59.999]` (业务时区)
pub fn day_window(date: NaiveDate, tz: Tz) -> (i64, i64) {
    let start = day_start_millis(date, tz);
    let end = date
        .succ_opt()
        .map(|next| day_start_millis(next, tz) - 1)
        .unwrap_or(i64::MAX);
    (start, end)
}
