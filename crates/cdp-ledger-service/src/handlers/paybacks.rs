//! Payback handlers.
//!
//! Creation and amount updates are checked against the code's deposited
//! total inside the store; handlers only authenticate, authorize and map the
//! outcome.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cdp_ledger_core::{Capability, Payback, PaybackCreate, PaybackId, PaybackUpdate};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::handlers::MessageResponse;
use crate::state::AppState;

/// List all paybacks.
pub async fn list_paybacks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Payback>>, ApiError> {
    Ok(Json(state.store.list_paybacks().await?))
}

/// Get a payback by sequence number.
pub async fn get_payback(
    State(state): State<Arc<AppState>>,
    Path(stt): Path<PaybackId>,
) -> Result<Json<Payback>, ApiError> {
    let payback = state
        .store
        .get_payback(stt)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("payback {stt} not found")))?;

    Ok(Json(payback))
}

/// List the paybacks recorded against a code.
pub async fn list_paybacks_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<Payback>>, ApiError> {
    let paybacks = state.store.list_paybacks_by_code(&code).await?;
    if paybacks.is_empty() {
        return Err(ApiError::NotFound(format!("no paybacks for code {code}")));
    }
    Ok(Json(paybacks))
}

/// Outstanding balance of a code.
///
/// The balance is reported as computed, even if negative.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ledger = state
        .store
        .code_ledger(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no deposits for code {code}")))?;

    Ok(Json(MessageResponse::new(format!(
        "Balance of code {code} is {}",
        ledger.balance()
    ))))
}

/// Record a payback.
pub async fn create_payback(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidJson(body): ValidJson<PaybackCreate>,
) -> Result<(StatusCode, Json<Payback>), ApiError> {
    auth.require(Capability::CreatePayback)?;

    let payback = state.store.create_payback(&body).await?;

    tracing::info!(
        stt = %payback.stt,
        code = %payback.code,
        amount = payback.amount,
        user_id = %auth.id(),
        "Payback recorded"
    );

    Ok((StatusCode::CREATED, Json(payback)))
}

/// Update a payback's visibility and, optionally, its amount.
pub async fn update_payback(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(stt): Path<PaybackId>,
    ValidJson(body): ValidJson<PaybackUpdate>,
) -> Result<Json<Payback>, ApiError> {
    // Existence is reported before authorization
    if state.store.get_payback(stt).await?.is_none() {
        return Err(ApiError::NotFound(format!("payback {stt} not found")));
    }
    auth.require(Capability::UpdatePayback)?;

    let payback = state.store.update_payback(stt, &body).await?;

    tracing::info!(
        stt = %stt,
        amount = payback.amount,
        user_id = %auth.id(),
        "Payback updated"
    );

    Ok(Json(payback))
}
