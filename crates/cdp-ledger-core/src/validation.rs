//! Field-level validation for request shapes.
//!
//! Every creatable or updatable shape implements [`Validate`]. The HTTP layer
//! runs it right after deserialization, so handlers only ever see input that
//! passed these checks.

use crate::error::{LedgerError, Result};

/// Minimum length of a grouping code, in characters.
pub const MIN_CODE_LEN: usize = 8;

/// Input shapes that carry field constraints.
pub trait Validate {
    /// Check every field constraint of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] naming the first offending field.
    fn validate(&self) -> Result<()>;
}

/// A margin must lie within `[0, 1]`; both bounds are accepted.
///
/// # Errors
///
/// Rejects values strictly outside the interval and non-finite values.
pub fn validate_margin(margin: f64) -> Result<()> {
    if !margin.is_finite() || margin > 1.0 || margin < 0.0 {
        return Err(LedgerError::validation(
            "margin",
            "value must be between 0 and 1",
        ));
    }
    Ok(())
}

/// A deposit code must be at least [`MIN_CODE_LEN`] characters long.
///
/// # Errors
///
/// Rejects shorter codes.
pub fn validate_code(code: &str) -> Result<()> {
    if code.chars().count() < MIN_CODE_LEN {
        return Err(LedgerError::validation(
            "code",
            format!("must be at least {MIN_CODE_LEN} characters"),
        ));
    }
    Ok(())
}

/// Reject empty or whitespace-only strings.
///
/// # Errors
///
/// Returns a validation error for `field` when `value` is blank.
pub fn validate_not_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Loose address check: one `@`, non-empty local part, dotted domain.
///
/// # Errors
///
/// Returns a validation error for `email` when the shape is wrong.
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || LedgerError::validation("email", "not a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_bounds_are_inclusive() {
        assert!(validate_margin(0.0).is_ok());
        assert!(validate_margin(1.0).is_ok());
        assert!(validate_margin(0.5).is_ok());
    }

    #[test]
    fn margin_outside_unit_interval_is_rejected() {
        assert!(validate_margin(-0.01).is_err());
        assert!(validate_margin(1.01).is_err());
        assert!(validate_margin(f64::NAN).is_err());
        assert!(validate_margin(f64::INFINITY).is_err());
    }

    #[test]
    fn code_needs_eight_characters() {
        assert!(validate_code("ABCDEFGH").is_ok());
        assert!(validate_code("ABCDEFGHIJ").is_ok());
        assert!(validate_code("ABCDEFG").is_err());
        assert!(validate_code("").is_err());
    }

    #[test]
    fn code_length_counts_characters_not_bytes() {
        // 7 characters, 14 bytes
        assert!(validate_code("ééééééé").is_err());
        assert!(validate_code("éééééééé").is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());

        assert!(validate_email("example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@example").is_err());
        assert!(validate_email("a@@example.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
        assert!(validate_email("a@.com").is_err());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("title", "hello").is_ok());
        assert!(validate_not_blank("title", "   ").is_err());
    }
}
