//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Socket-level failure (refused, reset, broken pipe, closed with error)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Connect or idle timeout elapsed
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Whether the failure was a timeout (connect or idle)
    pub fn is_timeout(&self) -> bool {
        matches!(self, PrintError::Timeout(_))
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
