// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Narrow retry loop for one known RPC provider quirk.
//!
//! Some hosted nodes intermittently reject well-formed calls with
//! `-32602 too many arguments, want at most 1`. Re-sending the same call
//! succeeds, so that one error is retried after a fixed delay. Every other
//! failure is returned to the caller on first occurrence.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Message fragment identifying the retryable provider error.
pub const TRANSIENT_RPC_ERROR: &str = "too many arguments, want at most 1";

/// Default number of attempts.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Whether an error message is the provider quirk worth retrying.
pub fn is_transient_rpc_error(message: &str) -> bool {
    message.contains(TRANSIENT_RPC_ERROR)
}

/// Attempt bound and fixed delay for [`retry_on_transient_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Failure of a retried operation.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The operation failed with a non-retryable error.
    #[error("{0}")]
    Failed(E),

    /// Every attempt hit the transient provider error.
    #[error("Exceeded maximum retries with error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Run `operation`, retrying only while it fails with the transient
/// provider error.
pub async fn retry_on_transient_error<T, E, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut last_error = String::new();

    for attempt in 1..=policy.attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let message = e.to_string();
                if !is_transient_rpc_error(&message) {
                    return Err(RetryError::Failed(e));
                }

                warn!(
                    attempt,
                    max_attempts = policy.attempts,
                    error = %message,
                    "Transient RPC error, retrying"
                );
                last_error = message;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }

    Err(RetryError::Exhausted {
        attempts: policy.attempts,
        last_error,
    })
}
