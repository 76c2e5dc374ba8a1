// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::warn;

use super::{client_ip::ClientIp, enforce_rate_limit, json_body};
use crate::{
    blockchain::{TransferSubmission, TransferSubmitter},
    error::ApiError,
    models::{NativeTransferRequest, TokenTransferRequest, TransferResponse},
    state::AppState,
};

pub const CRYPTO_CHAIN_TRANSFER: &str = "crypto_chain_transfer";
pub const CRYPTO_TOKEN_TRANSFER: &str = "crypto_token_transfer";

async fn submit(
    state: &AppState,
    submission: TransferSubmission,
) -> Result<Json<TransferResponse>, ApiError> {
    let blockchain = &submission.transfer.blockchain;
    let chain = state.chains.connect(blockchain)?;

    let tx_hash = TransferSubmitter::new(chain.as_ref(), state.retry)
        .submit(&submission)
        .await
        .inspect_err(|e| {
            warn!(
                blockchain = %blockchain,
                sender = %submission.transfer.sender,
                error = %e,
                "Transfer rejected"
            )
        })?;

    Ok(Json(TransferResponse::new(tx_hash)))
}

/// Sign and broadcast a native currency transfer.
///
/// The transfer is refused unless the fee recomputed now equals
/// `calculated_gas_fee` from the earlier quote.
#[utoipa::path(
    post,
    path = "/v1/transfers/native",
    request_body = NativeTransferRequest,
    tag = "Transfers",
    responses(
        (status = 200, description = "Transaction broadcast", body = TransferResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Fee mismatch, node failure or retries exhausted")
    )
)]
pub async fn submit_native_transfer(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<NativeTransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    enforce_rate_limit(&state, &client_ip, CRYPTO_CHAIN_TRANSFER)?;
    let submission = json_body(payload)?.into_submission()?;
    submit(&state, submission).await
}

/// Sign and broadcast an ERC-20 `transfer` call.
///
/// The transfer is refused unless the fee recomputed now equals
/// `calculated_gas_fee` from the earlier quote.
#[utoipa::path(
    post,
    path = "/v1/transfers/token",
    request_body = TokenTransferRequest,
    tag = "Transfers",
    responses(
        (status = 200, description = "Transaction broadcast", body = TransferResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Fee mismatch, node failure or retries exhausted")
    )
)]
pub async fn submit_token_transfer(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<TokenTransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    enforce_rate_limit(&state, &client_ip, CRYPTO_TOKEN_TRANSFER)?;
    let submission = json_body(payload)?.into_submission()?;
    submit(&state, submission).await
}
