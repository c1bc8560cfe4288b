//! Core types and logic for cdp-ledger.
//!
//! This crate provides the foundational types used throughout the service:
//!
//! - **Identifiers**: `UserId`, `PostId`, `DepositId`, `PaybackId`
//! - **Ledger**: `Deposit`, `Payback` and the `CodeLedger` balance accounting
//! - **Blog**: `User`, `Post`, `VoteRequest`
//! - **Validation**: the `Validate` trait and field validators
//! - **Access**: `Role` and `Capability`
//!
//! # Balance invariant
//!
//! For every grouping code, the sum of absolute payback amounts never exceeds
//! the sum of absolute deposit amounts. [`CodeLedger::ensure_payback_fits`] is
//! the single place that decides it; storage backends call it inside their
//! write transaction.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod deposit;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod payback;
pub mod post;
pub mod user;
pub mod validation;

pub use access::{Capability, Role};
pub use deposit::{Deposit, DepositCreate, DepositUpdate};
pub use error::{LedgerError, Result};
pub use ids::{DepositId, IdError, PaybackId, PostId, UserId};
pub use ledger::{absolute_total, CodeLedger};
pub use payback::{Payback, PaybackCreate, PaybackUpdate};
pub use post::{Post, PostDetail, PostInput, PostQuery, PostWithVotes, VoteDirection, VoteRequest};
pub use user::{NewUser, User, UserCreate, UserProfile};
pub use validation::{Validate, MIN_CODE_LEN};
