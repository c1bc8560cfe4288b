//! HTTP request handlers.

pub mod deposits;
pub mod health;
pub mod login;
pub mod paybacks;
pub mod posts;
pub mod users;
pub mod votes;

use serde::Serialize;

/// Plain `{"message": ...}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
