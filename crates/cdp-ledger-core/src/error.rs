//! Error types for cdp-ledger.

/// Result type for cdp-ledger domain operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors raised by the domain layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// An input field failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// A payback would push the paid-back total past the deposited total.
    #[error(
        "payback of {requested} exceeds the threshold of code {code}: deposited={deposited}, paid_back={paid_back}"
    )]
    OverThreshold {
        /// The grouping code.
        code: String,
        /// Sum of absolute deposit amounts.
        deposited: i64,
        /// Sum of absolute payback amounts already recorded.
        paid_back: i64,
        /// Absolute amount of the rejected payback.
        requested: i64,
    },
}

impl LedgerError {
    /// Shorthand for a validation failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
