//! Storage layer for cdp-ledger.
//!
//! This crate provides persistence for users, posts, votes, deposits and
//! paybacks behind the [`Store`] trait, with two backends:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, schema created by embedded migrations
//! - [`MemoryStore`]: in-process tables, used by tests and database-less runs
//!
//! # Balance invariant
//!
//! Payback writes go through [`Store::create_payback`] and
//! [`Store::update_payback`], which read the code's totals, validate them with
//! [`CodeLedger::ensure_payback_fits`] and write in one atomic unit. Concurrent
//! paybacks on the same code cannot both pass the check against stale totals.
//!
//! # Example
//!
//! ```no_run
//! use cdp_ledger_store::{MemoryStore, Store};
//!
//! # async fn demo() -> cdp_ledger_store::Result<()> {
//! let store = MemoryStore::new();
//! let ledger = store.code_ledger("ABCDEFGH").await?;
//! assert!(ledger.is_none());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use cdp_ledger_core::{
    CodeLedger, Deposit, DepositCreate, DepositId, DepositUpdate, NewUser, Payback,
    PaybackCreate, PaybackId, PaybackUpdate, PostDetail, PostId, PostInput, PostQuery,
    PostWithVotes, User, UserId,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (PostgreSQL, in-memory for testing).
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email or phone number is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Get a user by login email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Delete a user together with their posts and votes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    // =========================================================================
    // Post Operations
    // =========================================================================

    /// Insert a post owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the owner doesn't exist.
    async fn create_post(&self, owner: UserId, input: &PostInput) -> Result<PostDetail>;

    /// List posts with vote tallies, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostWithVotes>>;

    /// Get a post with its vote tally.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_post(&self, id: PostId) -> Result<Option<PostWithVotes>>;

    /// Replace a post's title, content and visibility.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the post doesn't exist.
    async fn update_post(&self, id: PostId, input: &PostInput) -> Result<PostDetail>;

    /// Delete a post and its votes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the post doesn't exist.
    async fn delete_post(&self, id: PostId) -> Result<()>;

    // =========================================================================
    // Vote Operations
    // =========================================================================

    /// Record a vote by `user` on `post`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the post doesn't exist.
    /// - `StoreError::Conflict` if the user already voted on the post.
    async fn add_vote(&self, user: UserId, post: PostId) -> Result<()>;

    /// Withdraw a vote by `user` on `post`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such vote.
    async fn remove_vote(&self, user: UserId, post: PostId) -> Result<()>;

    // =========================================================================
    // Deposit Operations
    // =========================================================================

    /// Insert a deposit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn create_deposit(&self, deposit: &DepositCreate) -> Result<Deposit>;

    /// List all deposits, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_deposits(&self) -> Result<Vec<Deposit>>;

    /// Get a deposit by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_deposit(&self, stt: DepositId) -> Result<Option<Deposit>>;

    /// List the deposits sharing `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_deposits_by_code(&self, code: &str) -> Result<Vec<Deposit>>;

    /// Apply a partial update to a deposit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the deposit doesn't exist.
    async fn update_deposit(&self, stt: DepositId, update: &DepositUpdate) -> Result<Deposit>;

    // =========================================================================
    // Payback Operations
    // =========================================================================

    /// List all paybacks, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_paybacks(&self) -> Result<Vec<Payback>>;

    /// Get a payback by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_payback(&self, stt: PaybackId) -> Result<Option<Payback>>;

    /// List the paybacks recorded against `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_paybacks_by_code(&self, code: &str) -> Result<Vec<Payback>>;

    /// Current totals for `code`, or `None` when no deposit carries it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn code_ledger(&self, code: &str) -> Result<Option<CodeLedger>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Validate a payback against its code's totals and insert it atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no deposit carries the code.
    /// - `StoreError::Ledger` if the payback exceeds the deposited total.
    async fn create_payback(&self, payback: &PaybackCreate) -> Result<Payback>;

    /// Apply a partial update to a payback, re-validating a changed amount.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the payback doesn't exist.
    /// - `StoreError::Ledger` if the new amount exceeds the deposited total.
    async fn update_payback(&self, stt: PaybackId, update: &PaybackUpdate) -> Result<Payback>;
}
