//! Credential exchange.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::issue_token;
use crate::crypto::verify_password;
use crate::error::ApiError;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plain password.
    pub password: String,
}

/// Issued access token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed JWT.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

/// Exchange email and password for an access token.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || ApiError::Forbidden("Invalid Credentials".into());

    let user = state
        .store
        .find_user_by_email(body.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&body.password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    let access_token = issue_token(
        &state.config.jwt_secret,
        user.id,
        state.config.access_token_expire_minutes,
    )?;

    tracing::debug!(user_id = %user.id, "Access token issued");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}
