//! User registration and lookup handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cdp_ledger_core::{NewUser, UserCreate, UserId, UserProfile};

use crate::auth::AuthUser;
use crate::crypto::hash_password;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;

/// Register a new user.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<UserCreate>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let password_hash = hash_password(&body.password)?;

    let user = state
        .store
        .create_user(&NewUser {
            email: body.email.trim().to_string(),
            password_hash,
            phone_number: body.phone_number,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// Get a user's public fields.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

    Ok(Json(user.profile()))
}

/// Delete the caller's account along with their posts and votes.
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.store.delete_user(auth.id()).await?;

    tracing::info!(user_id = %auth.id(), "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
