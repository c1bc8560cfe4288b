//! Balance accounting for a grouping code.
//!
//! Deposits and paybacks are grouped by code. The sign of a stored amount
//! carries no accounting meaning (negative deposits are corrections), so every
//! total is a sum of absolute values:
//!
//! ```text
//! total_deposited = Σ |deposit.amount|
//! total_paid_back = Σ |payback.amount|
//! balance         = total_deposited - total_paid_back
//! ```
//!
//! A new payback is accepted only while `total_paid_back + |amount|` stays at
//! or below `total_deposited`.

use serde::Serialize;

use crate::error::{LedgerError, Result};

/// Sum the absolute values of `amounts`, saturating at `i64::MAX`.
#[must_use]
pub fn absolute_total<I>(amounts: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    let total = amounts
        .into_iter()
        .map(i64::unsigned_abs)
        .fold(0_u64, u64::saturating_add);
    i64::try_from(total).unwrap_or(i64::MAX)
}

/// Running totals for one grouping code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLedger {
    /// The grouping code.
    pub code: String,
    /// Sum of absolute deposit amounts.
    pub total_deposited: i64,
    /// Sum of absolute payback amounts.
    pub total_paid_back: i64,
}

impl CodeLedger {
    /// Build the totals for `code` from raw deposit and payback amounts.
    pub fn from_amounts<D, P>(code: impl Into<String>, deposits: D, paybacks: P) -> Self
    where
        D: IntoIterator<Item = i64>,
        P: IntoIterator<Item = i64>,
    {
        Self {
            code: code.into(),
            total_deposited: absolute_total(deposits),
            total_paid_back: absolute_total(paybacks),
        }
    }

    /// Outstanding balance. Not clamped: legacy data may already be overdrawn.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.total_deposited.saturating_sub(self.total_paid_back)
    }

    /// Check that a payback of `amount` fits under the deposited total.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::OverThreshold`] when the payback would take the
    /// paid-back total above the deposited total.
    pub fn ensure_payback_fits(&self, amount: i64) -> Result<()> {
        let requested = absolute_total([amount]);
        if self.total_paid_back.saturating_add(requested) > self.total_deposited {
            return Err(LedgerError::OverThreshold {
                code: self.code.clone(),
                deposited: self.total_deposited,
                paid_back: self.total_paid_back,
                requested,
            });
        }
        Ok(())
    }

    /// Record an accepted payback in the running totals.
    pub fn apply_payback(&mut self, amount: i64) {
        self.total_paid_back = self
            .total_paid_back
            .saturating_add(absolute_total([amount]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "ABCDEFGH";

    #[test]
    fn totals_use_absolute_values() {
        let ledger = CodeLedger::from_amounts(CODE, [100, -50], [-20]);
        assert_eq!(ledger.total_deposited, 150);
        assert_eq!(ledger.total_paid_back, 20);
        assert_eq!(ledger.balance(), 130);
    }

    #[test]
    fn balance_ignores_sign_of_deposits() {
        let negative = CodeLedger::from_amounts(CODE, [-100, -50], []);
        let positive = CodeLedger::from_amounts(CODE, [100, 50], []);
        assert_eq!(negative.total_deposited, positive.total_deposited);
        assert_eq!(negative.balance(), positive.balance());
    }

    #[test]
    fn payback_up_to_deposited_total_fits() {
        let ledger = CodeLedger::from_amounts(CODE, [100, -50], [100]);
        assert!(ledger.ensure_payback_fits(50).is_ok());
        assert!(ledger.ensure_payback_fits(0).is_ok());
    }

    #[test]
    fn payback_over_deposited_total_is_rejected() {
        let ledger = CodeLedger::from_amounts(CODE, [100, -50], [100]);
        let err = ledger.ensure_payback_fits(60).unwrap_err();
        assert_eq!(
            err,
            LedgerError::OverThreshold {
                code: CODE.to_string(),
                deposited: 150,
                paid_back: 100,
                requested: 60,
            }
        );
    }

    #[test]
    fn negative_payback_counts_its_magnitude() {
        let ledger = CodeLedger::from_amounts(CODE, [10], []);
        assert!(ledger.ensure_payback_fits(-11).is_err());
        assert!(ledger.ensure_payback_fits(-10).is_ok());
    }

    #[test]
    fn scenario_first_payback_then_overdraw() {
        let mut ledger = CodeLedger::from_amounts(CODE, [100, -50], []);

        ledger.ensure_payback_fits(100).unwrap();
        ledger.apply_payback(100);
        assert_eq!(ledger.balance(), 50);

        assert!(ledger.ensure_payback_fits(60).is_err());
        assert_eq!(ledger.balance(), 50);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let ledger = CodeLedger::from_amounts(CODE, [i64::MAX, i64::MIN], []);
        assert_eq!(ledger.total_deposited, i64::MAX);
        assert!(ledger.ensure_payback_fits(i64::MAX).is_ok());
    }

    #[test]
    fn overdrawn_balance_is_reported_negative() {
        let ledger = CodeLedger::from_amounts(CODE, [10], [15]);
        assert_eq!(ledger.balance(), -5);
    }
}
