// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Request},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        GasQuoteResponse, NativeGasRequest, NativeTransferRequest, TokenGasRequest,
        TokenTransferRequest, TransferResponse,
    },
    rate_limit::rate_limit_key,
    state::AppState,
};

pub mod client_ip;
pub mod gas;
pub mod health;
pub mod transfers;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/gas/native",
            post(gas::estimate_native_gas).fallback(method_not_allowed),
        )
        .route(
            "/gas/token",
            post(gas::estimate_token_gas).fallback(method_not_allowed),
        )
        .route(
            "/transfers/native",
            post(transfers::submit_native_transfer).fallback(method_not_allowed),
        )
        .route(
            "/transfers/token",
            post(transfers::submit_token_transfer).fallback(method_not_allowed),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Count the call against `operation` for this client, rejecting it once over quota.
fn enforce_rate_limit(state: &AppState, client_ip: &str, operation: &str) -> Result<(), ApiError> {
    if state
        .rate_limiter
        .is_rate_limited(&rate_limit_key(client_ip, operation))
    {
        warn!(client_ip, operation, "Rate limit exceeded");
        return Err(ApiError::too_many_requests());
    }
    Ok(())
}

/// Unwrap a JSON body, turning extractor rejections into the error envelope.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
        })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        gas::estimate_native_gas,
        gas::estimate_token_gas,
        transfers::submit_native_transfer,
        transfers::submit_token_transfer
    ),
    components(
        schemas(
            health::HealthResponse,
            NativeGasRequest,
            TokenGasRequest,
            GasQuoteResponse,
            NativeTransferRequest,
            TokenTransferRequest,
            TransferResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health probes"),
        (name = "Gas", description = "Transfer fee estimation"),
        (name = "Transfers", description = "Fee-bounded transfer submission")
    )
)]
struct ApiDoc;
