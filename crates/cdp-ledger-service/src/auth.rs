//! Authentication and authorization.
//!
//! This module provides:
//! - access token issuance and validation (HS256 JWTs signed with the
//!   configured secret)
//! - `AuthUser` - an extractor resolving the bearer token to a stored user
//! - `AccessPolicy` - assigns a `Role` to each authenticated principal

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use cdp_ledger_core::{Capability, Role, User, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Issued at.
    pub iat: i64,
    /// Expiration time.
    pub exp: i64,
}

/// Issue an access token for `user_id` valid for `ttl_minutes`.
///
/// # Errors
///
/// Returns `ApiError::Internal` if signing fails.
pub fn issue_token(secret: &str, user_id: UserId, ttl_minutes: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Validate an access token and return the user ID it was issued for.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for bad signatures, expired tokens and
/// malformed subjects.
pub fn validate_token(secret: &str, token: &str) -> Result<UserId, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    data.claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::Unauthorized)
}

/// Maps principals to roles.
///
/// Emails listed as ledger operators get [`Role::LedgerOperator`]; everyone
/// else is a [`Role::Member`]. Matching ignores ASCII case.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    operators: HashSet<String>,
}

impl AccessPolicy {
    /// Build a policy from the operator email list.
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            operators: operators
                .into_iter()
                .map(|email| email.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// The role held by the user with `email`.
    #[must_use]
    pub fn role_for(&self, email: &str) -> Role {
        if self.operators.contains(&email.to_ascii_lowercase()) {
            Role::LedgerOperator
        } else {
            Role::Member
        }
    }
}

/// An authenticated user extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The stored user the token was issued for.
    pub user: User,
    /// The role assigned by the access policy.
    pub role: Role,
}

impl AuthUser {
    /// The user ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.user.id
    }

    /// Fail with `403` unless the user's role grants `capability`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` when the capability is missing.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.role.can(capability) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.user.id,
            role = ?self.role,
            capability = ?capability,
            "Capability check failed"
        );
        Err(ApiError::not_allowed())
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract the Authorization header
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Extract the Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let user_id = validate_token(&state.config.jwt_secret, token)?;

        // Tokens outlive deleted users
        let user = state
            .store
            .get_user(user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        let role = state.access.role_for(&user.email);

        Ok(AuthUser { user, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_roundtrip() {
        let token = issue_token(SECRET, UserId::new(17), 30).unwrap();
        assert_eq!(validate_token(SECRET, &token).unwrap(), UserId::new(17));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, UserId::new(17), 30).unwrap();
        assert!(matches!(
            validate_token("other-secret", &token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Well past the default 60s leeway
        let token = issue_token(SECRET, UserId::new(17), -10).unwrap();
        assert!(matches!(
            validate_token(SECRET, &token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(validate_token(SECRET, "not.a.jwt").is_err());
    }

    #[test]
    fn policy_assigns_roles_case_insensitively() {
        let policy = AccessPolicy::new(["Operator@Example.com "]);
        assert_eq!(policy.role_for("operator@example.com"), Role::LedgerOperator);
        assert_eq!(policy.role_for("OPERATOR@EXAMPLE.COM"), Role::LedgerOperator);
        assert_eq!(policy.role_for("someone@example.com"), Role::Member);
    }

    #[test]
    fn empty_policy_has_no_operators() {
        let policy = AccessPolicy::default();
        assert_eq!(policy.role_for("operator@example.com"), Role::Member);
    }
}
