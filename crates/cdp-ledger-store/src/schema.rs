//! Table names of the relational schema.
//!
//! The tables themselves are created by the embedded migrations under
//! `migrations/`.

/// Table names in the PostgreSQL database.
pub mod table {
    /// Registered users.
    pub const USERS: &str = "users";

    /// Blog posts, owned by a user (cascade on user delete).
    pub const POSTS: &str = "posts";

    /// Votes keyed by `(user_id, post_id)` (cascade on either side).
    pub const VOTES: &str = "votes";

    /// Deposits, grouped by `code`.
    pub const DEPOSITS: &str = "cdp";

    /// Paybacks, associated with deposits through `code` only.
    pub const PAYBACKS: &str = "cdp_payback";
}

/// Returns all table names, in creation order.
#[must_use]
pub fn all_tables() -> Vec<&'static str> {
    vec![
        table::USERS,
        table::POSTS,
        table::VOTES,
        table::DEPOSITS,
        table::PAYBACKS,
    ]
}
