// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory node used by unit and router tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use alloy::{
    primitives::{address, keccak256, Address, Bytes},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

use super::client::{ChainClientError, ChainConnect, ChainConnector};
use super::types::RpcEndpoint;

/// First Anvil/Hardhat development account.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

const TRANSIENT: &str =
    "server returned an error response: error code -32602: too many arguments, want at most 1";

pub struct MockChain {
    connected: bool,
    nonce: u64,
    gas_estimate: u64,
    gas_price: u128,
    estimate_error: Option<String>,
    transient_failures: AtomicU32,
    estimated: Mutex<Vec<TransactionRequest>>,
    broadcasts: Mutex<Vec<Bytes>>,
}

impl MockChain {
    pub fn new(gas_estimate: u64, gas_price: u128) -> Self {
        Self {
            connected: true,
            nonce: 0,
            gas_estimate,
            gas_price,
            estimate_error: None,
            transient_failures: AtomicU32::new(0),
            estimated: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn failing_estimates(mut self, message: &str) -> Self {
        self.estimate_error = Some(message.to_string());
        self
    }

    /// Fail the next `count` gas estimations with the provider quirk.
    pub fn with_transient_failures(self, count: u32) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn estimated(&self) -> Vec<TransactionRequest> {
        self.estimated.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainConnector for MockChain {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, ChainClientError> {
        Ok(self.nonce)
    }

    async fn gas_price(&self) -> Result<u128, ChainClientError> {
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, ChainClientError> {
        self.estimated.lock().unwrap().push(tx);

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ChainClientError::RpcError(format!(
                "eth_estimateGas failed: {TRANSIENT}"
            )));
        }

        match &self.estimate_error {
            Some(message) => Err(ChainClientError::RpcError(message.clone())),
            None => Ok(self.gas_estimate),
        }
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<String, ChainClientError> {
        let hash = keccak256(&raw);
        self.broadcasts.lock().unwrap().push(raw);
        Ok(format!("{hash:?}"))
    }
}

/// Hands out the same [`MockChain`] for every blockchain name the
/// production endpoint template accepts.
pub struct MockConnect(pub Arc<MockChain>);

impl ChainConnect for MockConnect {
    fn connect(&self, blockchain: &str) -> Result<Arc<dyn ChainConnector>, ChainClientError> {
        RpcEndpoint::new("http://127.0.0.1:8545/{blockchain}/{access_token}", "test-token")
            .url_for(blockchain)?;
        Ok(self.0.clone())
    }
}
