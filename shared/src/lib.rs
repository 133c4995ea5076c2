//! Shared types for the Cutting Chai POS
//!
//! Types used by the server and understood by the dashboards: the unified
//! error system, domain models and realtime wire frames.

pub mod error;
pub mod models;
pub mod realtime;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
