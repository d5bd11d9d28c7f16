//! Input validation helpers
//!
//! Text length limits and the parsers for numbers typed into the customer
//! and admin screens.

use shared::models::MAX_PORTION_QTY;
use shared::util::parse_non_negative;

use crate::utils::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Names: product, category, first / last name
pub const MAX_NAME_LEN: usize = 200;

/// Product description
pub const MAX_NOTE_LEN: usize = 500;

/// Mobile numbers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Image URLs
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
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
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Mobile numbers: digits with an optional leading `+`
pub fn validate_mobile(mobile: &str) -> Result<(), AppError> {
    validate_required_text(mobile, "mobile", MAX_SHORT_TEXT_LEN)?;
    let digits = mobile.trim().strip_prefix('+').unwrap_or(mobile.trim());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "mobile must contain digits only",
        )
        .with_detail("field", "mobile"));
    }
    Ok(())
}

/// Table number typed or scanned at checkout; `0` is reserved for "empty tray"
pub fn parse_table_number(input: &str) -> Result<u32, AppError> {
    match parse_non_negative(input) {
        Some(table) if table > 0 => Ok(table),
        _ => Err(AppError::new(ErrorCode::TableNumberInvalid).with_detail("value", input)),
    }
}

/// Portion counts of one line, after any accumulation
pub fn validate_portion_qty(full: u32, half: u32) -> Result<(), AppError> {
    for (field, qty) in [("fullPortionQty", full), ("halfPortionQty", half)] {
        if qty > MAX_PORTION_QTY {
            return Err(AppError::new(ErrorCode::PortionQuantityTooLarge)
                .with_detail("field", field)
                .with_detail("max", MAX_PORTION_QTY));
        }
    }
    Ok(())
}
