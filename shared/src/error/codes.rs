//! Unified error codes for the POS backend
//!
//! This module defines all error codes returned by pos-server and understood by
//! the dashboards. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Branch errors
//! - 4xxx: Order errors
//! - 5xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Biller tried to reach another branch
    BranchAccessDenied = 2004,
    /// Initial admin registration is closed
    AdminAlreadyExists = 2005,

    // ==================== 3xxx: Branch ====================
    /// Branch not found
    BranchNotFound = 3001,
    /// Branch code already exists
    BranchCodeExists = 3002,
    /// Branch has no printer configured
    PrinterNotConfigured = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is completed or cancelled and cannot move to another status
    OrderStatusTerminal = 4002,
    /// Unknown order status
    InvalidOrderStatus = 4003,
    /// Order has no items
    OrderEmpty = 4004,
    /// Unknown payment mode
    InvalidPaymentMode = 4005,
    /// Malformed order line item
    InvalidOrderItem = 4006,

    // ==================== 5xxx: User ====================
    /// User not found
    UserNotFound = 5001,
    /// Email already registered
    EmailExists = 5002,
    /// Biller must be assigned a branch
    BillerBranchRequired = 5003,
    /// Cannot delete own account
    CannotDeleteSelf = 5004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::BranchAccessDenied => "Access denied for this branch",
            ErrorCode::AdminAlreadyExists => {
                "Admin already exists. Use admin login to create additional users."
            }

            // Branch
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::BranchCodeExists => "Branch already exists",
            ErrorCode::PrinterNotConfigured => "Printer IP not configured for this branch",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderStatusTerminal => "Order is already closed",
            ErrorCode::InvalidOrderStatus => "Invalid status",
            ErrorCode::OrderEmpty => "branchCode and items are required",
            ErrorCode::InvalidPaymentMode => "Invalid payment mode",
            ErrorCode::InvalidOrderItem => "Invalid order item",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailExists => "Email already registered",
            ErrorCode::BillerBranchRequired => "Biller must be assigned a branchCode",
            ErrorCode::CannotDeleteSelf => "Cannot delete own account",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::BranchAccessDenied),
            2005 => Ok(ErrorCode::AdminAlreadyExists),

            // Branch
            3001 => Ok(ErrorCode::BranchNotFound),
            3002 => Ok(ErrorCode::BranchCodeExists),
            3003 => Ok(ErrorCode::PrinterNotConfigured),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderStatusTerminal),
            4003 => Ok(ErrorCode::InvalidOrderStatus),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::InvalidPaymentMode),
            4006 => Ok(ErrorCode::InvalidOrderItem),

            // User
            5001 => Ok(ErrorCode::UserNotFound),
            5002 => Ok(ErrorCode::EmailExists),
            5003 => Ok(ErrorCode::BillerBranchRequired),
            5004 => Ok(ErrorCode::CannotDeleteSelf),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::BranchAccessDenied.code(), 2004);
        assert_eq!(ErrorCode::BranchNotFound.code(), 3001);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderStatusTerminal.code(), 4002);
        assert_eq!(ErrorCode::EmailExists.code(), 5002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidFormat,
            ErrorCode::RequiredField,
            ErrorCode::ValueOutOfRange,
            ErrorCode::NotAuthenticated,
            ErrorCode::InvalidCredentials,
            ErrorCode::TokenExpired,
            ErrorCode::TokenInvalid,
            ErrorCode::PermissionDenied,
            ErrorCode::AdminRequired,
            ErrorCode::BranchAccessDenied,
            ErrorCode::AdminAlreadyExists,
            ErrorCode::BranchNotFound,
            ErrorCode::BranchCodeExists,
            ErrorCode::PrinterNotConfigured,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderStatusTerminal,
            ErrorCode::InvalidOrderStatus,
            ErrorCode::OrderEmpty,
            ErrorCode::InvalidPaymentMode,
            ErrorCode::InvalidOrderItem,
            ErrorCode::UserNotFound,
            ErrorCode::EmailExists,
            ErrorCode::BillerBranchRequired,
            ErrorCode::CannotDeleteSelf,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
        ];

        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::OrderNotFound).unwrap(),
            "4001"
        );
        let code: ErrorCode = serde_json::from_str("2004").unwrap();
        assert_eq!(code, ErrorCode::BranchAccessDenied);
        assert!(serde_json::from_str::<ErrorCode>("4999").is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            ErrorCode::PrinterNotConfigured.message(),
            "Printer IP not configured for this branch"
        );
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }
}
