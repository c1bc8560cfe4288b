//! Posts and votes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::user::UserProfile;
use crate::validation::{validate_not_blank, Validate};
use crate::{PostId, UserId};

/// Default page size for post listings.
pub const DEFAULT_POST_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_POST_LIMIT: i64 = 100;

/// A persisted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Primary key.
    pub id: PostId,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Visibility flag (defaults to `true`).
    pub published: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Owning user.
    pub user_id: UserId,
}

/// A post together with its owner's public fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    /// The post itself.
    #[serde(flatten)]
    pub post: Post,
    /// The owning user.
    pub owner: UserProfile,
}

/// A post with its vote tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithVotes {
    /// The post and its owner.
    pub post: PostDetail,
    /// Number of votes cast for the post.
    pub votes: i64,
}

/// Create/replace body for posts.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Visibility flag.
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl Validate for PostInput {
    fn validate(&self) -> Result<()> {
        validate_not_blank("title", &self.title)?;
        validate_not_blank("content", &self.content)
    }
}

/// Listing parameters for posts.
#[derive(Debug, Clone, Deserialize)]
pub struct PostQuery {
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Rows to skip.
    #[serde(default)]
    pub skip: i64,
    /// Substring the title must contain.
    #[serde(default)]
    pub search: String,
}

fn default_limit() -> i64 {
    DEFAULT_POST_LIMIT
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_POST_LIMIT,
            skip: 0,
            search: String::new(),
        }
    }
}

impl PostQuery {
    /// Page size clamped to `0..=MAX_POST_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.clamp(0, MAX_POST_LIMIT)
    }

    /// Offset clamped to be non-negative.
    #[must_use]
    pub fn skip(&self) -> i64 {
        self.skip.max(0)
    }
}

/// What a vote request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    /// Cast a vote (`dir = 1`).
    Add,
    /// Withdraw a vote (`dir = 0`).
    Remove,
}

/// Vote request body.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    /// The post being voted on.
    pub post_id: PostId,
    /// `1` to vote, `0` to withdraw.
    pub dir: i32,
}

impl VoteRequest {
    /// Interpret `dir`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for anything but 0 or 1.
    pub fn direction(&self) -> Result<VoteDirection> {
        match self.dir {
            1 => Ok(VoteDirection::Add),
            0 => Ok(VoteDirection::Remove),
            _ => Err(LedgerError::validation("dir", "must be 0 or 1")),
        }
    }
}

impl Validate for VoteRequest {
    fn validate(&self) -> Result<()> {
        self.direction().map(|_| ())
    }
}
