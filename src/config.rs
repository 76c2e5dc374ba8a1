// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into an immutable [`ServerConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `RPC_URL_TEMPLATE` | Node URL with `{blockchain}` and `{access_token}` placeholders | `https://rpc.ankr.com/{blockchain}/{access_token}` |
//! | `RPC_ACCESS_TOKEN` | RPC provider access token | empty |
//! | `RPC_TIMEOUT_SECS` | Timeout for each RPC call | `10` |
//! | `RATE_LIMIT_MAX_REQUESTS` | Requests allowed per client and operation per window | `10` |
//! | `RATE_LIMIT_WINDOW_SECS` | Rate limit window length | `60` |
//! | `RETRY_ATTEMPTS` | Attempts for the provider-quirk retry | `5` |
//! | `RETRY_DELAY_MS` | Delay between those attempts | `1000` |
//! | `TLS_CERT_PATH` | PEM certificate chain; HTTPS when set with `TLS_KEY_PATH` | unset |
//! | `TLS_KEY_PATH` | PEM private key | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::retry::DEFAULT_RETRY_ATTEMPTS;
use crate::blockchain::{RetryPolicy, RpcEndpoint};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the node URL template.
///
/// `{blockchain}` is replaced by the request's blockchain name and
/// `{access_token}` by [`RPC_ACCESS_TOKEN_ENV`].
pub const RPC_URL_TEMPLATE_ENV: &str = "RPC_URL_TEMPLATE";

/// Environment variable name for the RPC provider access token.
///
/// This is a secret. It is never logged.
pub const RPC_ACCESS_TOKEN_ENV: &str = "RPC_ACCESS_TOKEN";

pub const RPC_TIMEOUT_SECS_ENV: &str = "RPC_TIMEOUT_SECS";
pub const RATE_LIMIT_MAX_REQUESTS_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const RATE_LIMIT_WINDOW_SECS_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
pub const RETRY_ATTEMPTS_ENV: &str = "RETRY_ATTEMPTS";
pub const RETRY_DELAY_MS_ENV: &str = "RETRY_DELAY_MS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Environment variable name for the log output format.
///
/// `json` selects structured JSON lines; anything else is human readable.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RPC_URL_TEMPLATE: &str = "https://rpc.ankr.com/{blockchain}/{access_token}";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 10;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} and {1} must be set together")]
    IncompleteTls(&'static str, &'static str),
}

/// PEM files for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Immutable server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub rpc_endpoint: RpcEndpoint,
    pub rpc_timeout: Duration,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub retry: RetryPolicy,
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: HOST_ENV,
                value: host,
            })?;

        let template =
            lookup(RPC_URL_TEMPLATE_ENV).unwrap_or_else(|| DEFAULT_RPC_URL_TEMPLATE.to_string());
        let access_token = lookup(RPC_ACCESS_TOKEN_ENV).unwrap_or_default();

        let rpc_timeout = Duration::from_secs(parse_or(
            &lookup,
            RPC_TIMEOUT_SECS_ENV,
            DEFAULT_RPC_TIMEOUT_SECS,
        )?);
        let rate_limit_max_requests = parse_or(
            &lookup,
            RATE_LIMIT_MAX_REQUESTS_ENV,
            DEFAULT_RATE_LIMIT_MAX_REQUESTS,
        )?;
        let rate_limit_window = Duration::from_secs(parse_or(
            &lookup,
            RATE_LIMIT_WINDOW_SECS_ENV,
            DEFAULT_RATE_LIMIT_WINDOW_SECS,
        )?);

        let retry = RetryPolicy {
            attempts: parse_or(&lookup, RETRY_ATTEMPTS_ENV, DEFAULT_RETRY_ATTEMPTS)?,
            delay: Duration::from_millis(parse_or(
                &lookup,
                RETRY_DELAY_MS_ENV,
                DEFAULT_RETRY_DELAY_MS,
            )?),
        };

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::IncompleteTls(
                    TLS_CERT_PATH_ENV,
                    TLS_KEY_PATH_ENV,
                ))
            }
        };

        Ok(Self {
            bind_addr,
            rpc_endpoint: RpcEndpoint::new(template, access_token),
            rpc_timeout,
            rate_limit_max_requests,
            rate_limit_window,
            retry,
            tls,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
