// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::{client_ip::ClientIp, enforce_rate_limit, json_body};
use crate::{
    blockchain::{Transfer, TransferSubmitter},
    error::ApiError,
    models::{GasQuoteResponse, NativeGasRequest, TokenGasRequest},
    state::AppState,
};

pub const CALCULATE_CHAIN_GAS_PRICE: &str = "calculate_chain_gas_price";
pub const CALCULATE_TOKEN_GAS_PRICE: &str = "calculate_token_gas_price";

async fn quote(state: &AppState, transfer: Transfer) -> Result<Json<GasQuoteResponse>, ApiError> {
    let chain = state.chains.connect(&transfer.blockchain)?;
    let quote = TransferSubmitter::new(chain.as_ref(), state.retry)
        .quote(&transfer)
        .await
        .inspect_err(|e| {
            tracing::warn!(blockchain = %transfer.blockchain, error = %e, "Gas estimation failed")
        })?;

    Ok(Json(GasQuoteResponse::try_from(quote)?))
}

/// Estimate the fee of a native currency transfer.
#[utoipa::path(
    post,
    path = "/v1/gas/native",
    request_body = NativeGasRequest,
    tag = "Gas",
    responses(
        (status = 200, description = "Fee quote", body = GasQuoteResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Node unreachable or estimation failed")
    )
)]
pub async fn estimate_native_gas(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<NativeGasRequest>, JsonRejection>,
) -> Result<Json<GasQuoteResponse>, ApiError> {
    enforce_rate_limit(&state, &client_ip, CALCULATE_CHAIN_GAS_PRICE)?;
    let transfer = json_body(payload)?.into_transfer()?;
    quote(&state, transfer).await
}

/// Estimate the fee of an ERC-20 `transfer` call.
#[utoipa::path(
    post,
    path = "/v1/gas/token",
    request_body = TokenGasRequest,
    tag = "Gas",
    responses(
        (status = 200, description = "Fee quote", body = GasQuoteResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Node unreachable or estimation failed")
    )
)]
pub async fn estimate_token_gas(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<TokenGasRequest>, JsonRejection>,
) -> Result<Json<GasQuoteResponse>, ApiError> {
    enforce_rate_limit(&state, &client_ip, CALCULATE_TOKEN_GAS_PRICE)?;
    let transfer = json_body(payload)?.into_transfer()?;
    quote(&state, transfer).await
}
