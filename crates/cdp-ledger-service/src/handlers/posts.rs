//! Post handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use cdp_ledger_core::{PostDetail, PostId, PostInput, PostQuery, PostWithVotes};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;

/// List posts with their vote tallies.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostQuery>,
) -> Result<Json<Vec<PostWithVotes>>, ApiError> {
    let posts = state.store.list_posts(&query).await?;
    Ok(Json(posts))
}

/// Get one post with its vote tally.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<PostId>,
) -> Result<Json<PostWithVotes>, ApiError> {
    let post = load(&state, id).await?;
    Ok(Json(post))
}

/// Create a post owned by the caller.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidJson(body): ValidJson<PostInput>,
) -> Result<(StatusCode, Json<PostDetail>), ApiError> {
    let post = state.store.create_post(auth.id(), &body).await?;

    tracing::debug!(post_id = %post.post.id, user_id = %auth.id(), "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// Replace a post. Owner only.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<PostId>,
    ValidJson(body): ValidJson<PostInput>,
) -> Result<Json<PostDetail>, ApiError> {
    ensure_owner(&auth, &load(&state, id).await?)?;

    let post = state.store.update_post(id, &body).await?;
    Ok(Json(post))
}

/// Delete a post. Owner only.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<PostId>,
) -> Result<StatusCode, ApiError> {
    ensure_owner(&auth, &load(&state, id).await?)?;

    state.store.delete_post(id).await?;

    tracing::debug!(post_id = %id, user_id = %auth.id(), "Post deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn load(state: &AppState, id: PostId) -> Result<PostWithVotes, ApiError> {
    state
        .store
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))
}

fn ensure_owner(auth: &AuthUser, post: &PostWithVotes) -> Result<(), ApiError> {
    if post.post.post.user_id == auth.id() {
        return Ok(());
    }
    tracing::warn!(
        post_id = %post.post.post.id,
        user_id = %auth.id(),
        "Post mutation by non-owner"
    );
    Err(ApiError::not_allowed())
}
