//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on reasonable UX limits for names, phones and
//! free-text notes; the embedded store enforces nothing on its own.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: table, zone, customer
pub const MAX_NAME_LEN: usize = 200;

/// Free text: special requests, cancel reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone numbers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Largest party a single booking may request; bigger events go through
/// staff, not the online flow
pub const MAX_PARTY_SIZE: i32 = 50;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
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

/// Validate a party size (must be positive and within the online limit).
pub fn validate_party_size(size: i32) -> Result<(), AppError> {
    if size <= 0 {
        return Err(AppError::validation(format!(
            "party_size must be positive, got {size}"
        )));
    }
    if size > MAX_PARTY_SIZE {
        return Err(AppError::validation(format!(
            "party_size {size} exceeds maximum {MAX_PARTY_SIZE}"
        )));
    }
    Ok(())
}

/// Validate a table capacity pair (capacity ≥ min_capacity ≥ 1).
pub fn validate_capacity(capacity: i32, min_capacity: i32) -> Result<(), AppError> {
    if capacity <= 0 {
        return Err(AppError::validation(format!(
            "capacity must be positive, got {capacity}"
        )));
    }
    if min_capacity < 1 || min_capacity > capacity {
        return Err(AppError::validation(format!(
            "min_capacity {min_capacity} must be between 1 and capacity {capacity}"
        )));
    }
    Ok(())
}
