//! Payback records.
//!
//! A payback references the deposits of its code by the code string alone;
//! there is no link to an individual deposit row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::{validate_not_blank, Validate};
use crate::PaybackId;

/// A persisted payback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payback {
    /// Sequence number (primary key).
    pub stt: PaybackId,
    /// Depositor being paid back.
    pub depositor: String,
    /// Paid-back amount.
    pub amount: i64,
    /// Grouping code of the deposits being paid back.
    pub code: String,
    /// Visibility flag (defaults to `false`).
    pub published: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Payback creation body.
#[derive(Debug, Clone, Deserialize)]
pub struct PaybackCreate {
    /// Depositor being paid back.
    pub depositor: String,
    /// Paid-back amount.
    pub amount: i64,
    /// Grouping code of the deposits being paid back.
    pub code: String,
    /// Backdated creation time; the database clock is used when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Visibility flag.
    #[serde(default)]
    pub published: bool,
}

impl Validate for PaybackCreate {
    fn validate(&self) -> Result<()> {
        validate_not_blank("depositor", &self.depositor)?;
        validate_not_blank("code", &self.code)
    }
}

/// Partial payback update.
///
/// A new `amount` is re-checked against the code's deposited total before it
/// is written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaybackUpdate {
    /// New visibility flag, if changing.
    #[serde(default)]
    pub published: Option<bool>,
    /// New amount, if changing.
    #[serde(default)]
    pub amount: Option<i64>,
}

impl Validate for PaybackUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_is_optional() {
        let parsed: PaybackCreate =
            serde_json::from_str(r#"{"depositor": "d", "amount": 10, "code": "ABCDEFGH"}"#)
                .unwrap();
        assert!(parsed.created_at.is_none());
        assert!(!parsed.published);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn created_at_accepts_rfc3339() {
        let parsed: PaybackCreate = serde_json::from_str(
            r#"{"depositor": "d", "amount": 10, "code": "ABCDEFGH",
                "created_at": "2022-04-04T22:14:45Z"}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.created_at.unwrap().to_rfc3339(),
            "2022-04-04T22:14:45+00:00"
        );
    }

    #[test]
    fn blank_code_is_rejected() {
        let create = PaybackCreate {
            depositor: "d".into(),
            amount: 1,
            code: String::new(),
            created_at: None,
            published: false,
        };
        assert!(create.validate().is_err());
    }

    #[test]
    fn empty_update_changes_nothing() {
        let update: PaybackUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.published.is_none());
        assert!(update.amount.is_none());
    }
}
