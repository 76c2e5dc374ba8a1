// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain Transfer Server - gas quotes and fee-bounded EVM transfers
//!
//! This crate exposes an HTTP API that quotes the gas fee of native and
//! ERC-20 transfers on EVM chains and submits those transfers only while the
//! re-estimated fee still equals the quoted one.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - JSON-RPC connector, fee estimation, signing and submission
//! - `config` - Environment configuration
//! - `rate_limit` - Per-client fixed-window quotas

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod state;
