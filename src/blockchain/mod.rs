// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for EVM-compatible chains.
//!
//! This module provides functionality for:
//! - Connecting to hosted JSON-RPC nodes per blockchain name
//! - Gas fee estimation for native and ERC-20 transfers
//! - Fee-bounded transaction signing and broadcasting
//! - The narrow provider-quirk retry loop

pub mod client;
pub mod erc20;
pub mod fees;
pub mod retry;
pub mod signing;
pub mod transactions;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChainClient, ChainClientError, ChainConnect, ChainConnector, RpcConnector};
pub use fees::{estimate_fee, estimation_request, quote_transfer};
pub use retry::{is_transient_rpc_error, retry_on_transient_error, RetryError, RetryPolicy};
pub use signing::{create_signer, create_wallet, sign_transaction};
pub use transactions::{
    format_amount, parse_amount, parse_base_units, TransferError, TransferSubmission,
    TransferSubmitter,
};
pub use types::*;
