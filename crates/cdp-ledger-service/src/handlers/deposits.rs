//! Deposit (CDP) handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cdp_ledger_core::{Capability, Deposit, DepositCreate, DepositId, DepositUpdate};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;

/// List all deposits.
pub async fn list_deposits(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Deposit>>, ApiError> {
    Ok(Json(state.store.list_deposits().await?))
}

/// Get a deposit by sequence number.
pub async fn get_deposit(
    State(state): State<Arc<AppState>>,
    Path(stt): Path<DepositId>,
) -> Result<Json<Deposit>, ApiError> {
    let deposit = state
        .store
        .get_deposit(stt)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("deposit {stt} not found")))?;

    Ok(Json(deposit))
}

/// List the deposits sharing a code.
pub async fn list_deposits_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<Deposit>>, ApiError> {
    let deposits = state.store.list_deposits_by_code(&code).await?;
    if deposits.is_empty() {
        return Err(ApiError::NotFound(format!("no deposits for code {code}")));
    }
    Ok(Json(deposits))
}

/// Record a deposit.
pub async fn create_deposit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidJson(body): ValidJson<DepositCreate>,
) -> Result<(StatusCode, Json<Deposit>), ApiError> {
    auth.require(Capability::CreateDeposit)?;

    let deposit = state.store.create_deposit(&body).await?;

    tracing::info!(
        stt = %deposit.stt,
        code = %deposit.code,
        amount = deposit.amount,
        user_id = %auth.id(),
        "Deposit recorded"
    );

    Ok((StatusCode::CREATED, Json(deposit)))
}

/// Update a deposit's visibility.
pub async fn update_deposit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(stt): Path<DepositId>,
    ValidJson(body): ValidJson<DepositUpdate>,
) -> Result<Json<Deposit>, ApiError> {
    // Existence is reported before authorization
    if state.store.get_deposit(stt).await?.is_none() {
        return Err(ApiError::NotFound(format!("deposit {stt} not found")));
    }
    auth.require(Capability::UpdateDeposit)?;

    let deposit = state.store.update_deposit(stt, &body).await?;

    tracing::info!(stt = %stt, user_id = %auth.id(), "Deposit updated");

    Ok(Json(deposit))
}
