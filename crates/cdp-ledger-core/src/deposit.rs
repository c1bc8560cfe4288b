//! Deposit (CDP) records.
//!
//! Many deposits may share one grouping code. The amount is signed, but only
//! its magnitude is ever accounted; see [`crate::ledger`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::{validate_code, validate_margin, validate_not_blank, Validate};
use crate::DepositId;

/// A persisted deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    /// Sequence number (primary key).
    pub stt: DepositId,
    /// Depositor display name.
    pub depositor: String,
    /// Depositor name prefix.
    pub depositor_pre: String,
    /// Depositor name suffix.
    pub depositor_suf: String,
    /// Signed amount.
    pub amount: i64,
    /// Margin within `[0, 1]`.
    pub margin: f64,
    /// Grouping code.
    pub code: String,
    /// Visibility flag (defaults to `false`).
    pub published: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Deposit creation body.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositCreate {
    /// Depositor display name.
    pub depositor: String,
    /// Depositor name prefix.
    pub depositor_pre: String,
    /// Depositor name suffix.
    pub depositor_suf: String,
    /// Signed amount.
    pub amount: i64,
    /// Margin within `[0, 1]`.
    pub margin: f64,
    /// Grouping code, at least eight characters.
    pub code: String,
    /// Visibility flag.
    #[serde(default)]
    pub published: bool,
}

impl Validate for DepositCreate {
    fn validate(&self) -> Result<()> {
        validate_not_blank("depositor", &self.depositor)?;
        validate_margin(self.margin)?;
        validate_code(&self.code)
    }
}

/// Partial deposit update. Only the visibility flag is mutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepositUpdate {
    /// New visibility flag, if changing.
    #[serde(default)]
    pub published: Option<bool>,
}

impl Validate for DepositUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(margin: f64, code: &str) -> DepositCreate {
        DepositCreate {
            depositor: "Nguyen Van A".into(),
            depositor_pre: "Nguyen".into(),
            depositor_suf: "A".into(),
            amount: 100,
            margin,
            code: code.into(),
            published: false,
        }
    }

    #[test]
    fn valid_deposit_passes() {
        assert!(create(0.0, "ABCDEFGH").validate().is_ok());
        assert!(create(1.0, "ABCDEFGH").validate().is_ok());
    }

    #[test]
    fn margin_and_code_are_checked() {
        assert!(create(-0.01, "ABCDEFGH").validate().is_err());
        assert!(create(1.01, "ABCDEFGH").validate().is_err());
        assert!(create(0.5, "ABCDEFG").validate().is_err());
    }

    #[test]
    fn published_defaults_to_false() {
        let body = r#"{
            "depositor": "d", "depositor_pre": "p", "depositor_suf": "s",
            "amount": -50, "margin": 0.2, "code": "ABCDEFGH"
        }"#;
        let parsed: DepositCreate = serde_json::from_str(body).unwrap();
        assert!(!parsed.published);
        assert_eq!(parsed.amount, -50);
    }
}
