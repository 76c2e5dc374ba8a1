// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-client request quotas.
//!
//! Handlers ask an injected [`RateLimiter`] whether a key of the form
//! `rate_limit_{client_ip}_{operation}` is over quota before doing any work.
//! The default [`FixedWindowRateLimiter`] counts requests per key in fixed
//! windows and keeps at most `capacity` keys in an LRU cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Decides whether a caller identified by `key` is over its quota.
///
/// Every call counts as one request against the key.
pub trait RateLimiter: Send + Sync {
    fn is_rate_limited(&self, key: &str) -> bool;
}

/// Build the limiter key for a client and operation.
pub fn rate_limit_key(client_ip: &str, operation: &str) -> String {
    format!("rate_limit_{client_ip}_{operation}")
}

/// Counter for one key in the current window.
struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counter.
pub struct FixedWindowRateLimiter {
    windows: Mutex<LruCache<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowRateLimiter {
    /// Default number of keys tracked at once.
    pub const DEFAULT_CAPACITY: usize = 10_000;

    /// Create a limiter allowing `max_requests` per key per `window`.
    ///
    /// - `capacity`: Max number of keys tracked; least recently seen keys are evicted.
    pub fn new(max_requests: u32, window: Duration, capacity: usize) -> Self {
        Self {
            windows: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            max_requests,
            window,
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn is_rate_limited(&self, key: &str) -> bool {
        let Ok(mut windows) = self.windows.lock() else {
            // A poisoned lock only means another request panicked mid-update.
            tracing::error!("Rate limiter lock poisoned, rejecting request");
            return true;
        };

        let now = Instant::now();
        if let Some(window) = windows.get_mut(key) {
            if now.duration_since(window.started_at) >= self.window {
                window.started_at = now;
                window.count = 0;
            }
            if window.count >= self.max_requests {
                return true;
            }
            window.count += 1;
            return false;
        }

        if self.max_requests == 0 {
            return true;
        }
        windows.put(
            key.to_string(),
            Window {
                started_at: now,
                count: 1,
            },
        );
        false
    }
}
