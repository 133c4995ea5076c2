//! Data models
//!
//! Shared between pos-server and the dashboards (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! JSON field names are camelCase; timestamps are Unix millis.

pub mod branch;
pub mod order;
pub mod user;

// Re-exports
pub use branch::*;
pub use order::*;
pub use user::*;
