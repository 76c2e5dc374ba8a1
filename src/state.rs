// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::{ChainConnect, RetryPolicy, RpcConnector};
use crate::config::ServerConfig;
use crate::rate_limit::{FixedWindowRateLimiter, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    /// Opens node connections per blockchain name
    pub chains: Arc<dyn ChainConnect>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(
        chains: Arc<dyn ChainConnect>,
        rate_limiter: Arc<dyn RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            chains,
            rate_limiter,
            retry,
        }
    }

    /// Wire the production connector and limiter from configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            Arc::new(RpcConnector::new(
                config.rpc_endpoint.clone(),
                config.rpc_timeout,
            )),
            Arc::new(FixedWindowRateLimiter::new(
                config.rate_limit_max_requests,
                config.rate_limit_window,
                FixedWindowRateLimiter::DEFAULT_CAPACITY,
            )),
            config.retry,
        )
    }
}
