// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::{ChainClientError, TransferError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Try again later.",
        )
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Invalid request method")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ChainClientError> for ApiError {
    fn from(err: ChainClientError) -> Self {
        match err {
            ChainClientError::InvalidRpcUrl(_)
            | ChainClientError::InvalidAmount(_)
            | ChainClientError::InvalidPrivateKey(_) => Self::bad_request(err.to_string()),
            ChainClientError::RpcError(_)
            | ChainClientError::Timeout(_)
            | ChainClientError::SigningFailed(_)
            | ChainClientError::TransactionFailed(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Validation(message) => Self::bad_request(message),
            TransferError::Chain(e) => e.into(),
            TransferError::ConnectionFailed
            | TransferError::FeeMismatch(_)
            | TransferError::FeeOutOfRange(_)
            | TransferError::RetryExhausted { .. } => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use axum::body::to_bytes;
    use std::time::Duration;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let limited = ApiError::too_many_requests();
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.message, "Rate limit exceeded. Try again later.");

        let method = ApiError::method_not_allowed();
        assert_eq!(method.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(method.message, "Invalid request method");

        let internal = ApiError::internal("oops");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn transfer_errors_map_to_status() {
        let validation: ApiError = TransferError::Validation("Missing required fields".into()).into();
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.message, "Missing required fields");

        let mismatch: ApiError = TransferError::FeeMismatch("gas fees do not match").into();
        assert_eq!(mismatch.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mismatch.message, "gas fees do not match");

        let overflow: ApiError = TransferError::FeeOutOfRange(U256::MAX).into();
        assert_eq!(overflow.status, StatusCode::INTERNAL_SERVER_ERROR);

        let offline: ApiError = TransferError::ConnectionFailed.into();
        assert_eq!(offline.message, "Failed to connect to blockchain node");

        let exhausted: ApiError = TransferError::RetryExhausted {
            attempts: 5,
            last_error: "too many arguments, want at most 1".into(),
        }
        .into();
        assert_eq!(
            exhausted.message,
            "Exceeded maximum retries with error: too many arguments, want at most 1"
        );
    }

    #[test]
    fn chain_errors_map_to_status() {
        let key: ApiError = ChainClientError::InvalidPrivateKey("odd length".into()).into();
        assert_eq!(key.status, StatusCode::BAD_REQUEST);

        let url: ApiError =
            TransferError::Chain(ChainClientError::InvalidRpcUrl("bad".into())).into();
        assert_eq!(url.status, StatusCode::BAD_REQUEST);

        let timeout: ApiError = ChainClientError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(timeout.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"success":false,"error":"bad data"}"#);
    }
}
