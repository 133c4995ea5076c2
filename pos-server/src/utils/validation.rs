//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on:
//! - 58mm/80mm receipt line width (item and branch names end up on paper)
//! - Reasonable UX limits for names and addresses
//! - SQLite TEXT has no built-in length enforcement

use std::net::IpAddr;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: users, branches, menu items on an order
pub const MAX_NAME_LEN: usize = 200;

/// Branch codes end up in every order id
pub const MAX_BRANCH_CODE_LEN: usize = 32;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::required(field));
    }
    if value.len() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::invalid_field(
            field,
            format!("is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Branch codes: ASCII letters, digits, `_` and `-` only
///
/// The code is embedded verbatim in order ids and room names.
pub fn validate_branch_code(code: &str) -> Result<(), AppError> {
    validate_required_text(code, "branchCode", MAX_BRANCH_CODE_LEN)?;
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::invalid_field(
            "branchCode",
            "may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

/// Minimal email shape check: `local@domain` with a dot in the domain
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::invalid_field("email", "is not a valid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid_field(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::invalid_field(
            "password",
            format!("is too long (max {MAX_PASSWORD_LEN})"),
        ));
    }
    Ok(())
}

/// Printer addresses must be literal IPs; receipt printers sit on the branch LAN
pub fn validate_printer_ip(ip: &str) -> Result<(), AppError> {
    ip.trim()
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| AppError::invalid_field("printerIP", format!("'{ip}' is not an IP address")))
}
