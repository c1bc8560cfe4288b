//! Vote handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use cdp_ledger_core::{VoteDirection, VoteRequest};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::handlers::MessageResponse;
use crate::state::AppState;

/// Cast (`dir = 1`) or withdraw (`dir = 0`) the caller's vote on a post.
pub async fn vote(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidJson(body): ValidJson<VoteRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = match body.direction()? {
        VoteDirection::Add => {
            state.store.add_vote(auth.id(), body.post_id).await?;
            "successfully added vote"
        }
        VoteDirection::Remove => {
            state.store.remove_vote(auth.id(), body.post_id).await?;
            "successfully deleted vote"
        }
    };

    tracing::debug!(post_id = %body.post_id, user_id = %auth.id(), dir = body.dir, "Vote recorded");

    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))))
}
