//! Roles and capabilities for ledger mutations.
//!
//! Reads are public. Every write to the deposit/payback ledger requires a
//! [`Capability`], and principals receive capabilities through their
//! [`Role`]. Which principal holds which role is decided by the service's
//! access policy, not here.

use serde::{Deserialize, Serialize};

/// A ledger mutation a principal may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Record a new deposit.
    CreateDeposit,
    /// Change a deposit's visibility.
    UpdateDeposit,
    /// Record a new payback.
    CreatePayback,
    /// Change a payback.
    UpdatePayback,
}

/// A named bundle of capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Any authenticated user: may manage their own posts and votes only.
    Member,
    /// Manages the deposit/payback ledger.
    LedgerOperator,
}

impl Role {
    /// Capabilities granted by this role.
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Member => &[],
            Self::LedgerOperator => &[
                Capability::CreateDeposit,
                Capability::UpdateDeposit,
                Capability::CreatePayback,
                Capability::UpdatePayback,
            ],
        }
    }

    /// Whether this role grants `capability`.
    #[must_use]
    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}
