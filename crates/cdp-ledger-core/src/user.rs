//! User types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::{validate_email, validate_not_blank, Validate};
use crate::UserId;

/// A persisted user.
///
/// Deliberately not `Serialize`: the password hash must never reach a
/// response body. Use [`UserProfile`] for output.
#[derive(Debug, Clone)]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Unique login email.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Optional unique phone number.
    pub phone_number: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The public view of this user.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public user fields, embedded in post responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Primary key.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    /// Login email.
    pub email: String,
    /// Plaintext password; hashed before it reaches the store.
    pub password: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_not_blank("password", &self.password)?;
        if let Some(phone) = &self.phone_number {
            validate_not_blank("phone_number", phone)?;
        }
        Ok(())
    }
}

/// A user row ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Optional phone number.
    pub phone_number: Option<String>,
}
