// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC client for blockchain interactions.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

use super::types::RpcEndpoint;

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// The node operations the transfer flow relies on.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Whether the node answers at all.
    async fn is_connected(&self) -> bool;

    /// Transaction count (next nonce) of an address at the latest block.
    async fn transaction_count(&self, address: Address) -> Result<u64, ChainClientError>;

    /// Current legacy gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainClientError>;

    /// Gas units the node expects the transaction to use.
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, ChainClientError>;

    /// Broadcast an EIP-2718 encoded signed transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<String, ChainClientError>;
}

/// Opens a [`ChainConnector`] for a blockchain name.
pub trait ChainConnect: Send + Sync {
    fn connect(&self, blockchain: &str) -> Result<Arc<dyn ChainConnector>, ChainClientError>;
}

/// Connects to nodes through the configured RPC endpoint template.
#[derive(Debug, Clone)]
pub struct RpcConnector {
    endpoint: RpcEndpoint,
    timeout: Duration,
}

impl RpcConnector {
    pub fn new(endpoint: RpcEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }
}

impl ChainConnect for RpcConnector {
    fn connect(&self, blockchain: &str) -> Result<Arc<dyn ChainConnector>, ChainClientError> {
        let url = self.endpoint.url_for(blockchain)?;
        Ok(Arc::new(ChainClient::new(blockchain, url, self.timeout)))
    }
}

/// JSON-RPC client for a single EVM chain.
pub struct ChainClient {
    /// Blockchain name the client was opened for
    blockchain: String,
    /// Alloy HTTP provider
    provider: HttpProvider,
    /// Upper bound on every RPC round trip
    timeout: Duration,
    /// Node URL as transport errors render it; it carries the access token
    url: String,
}

impl ChainClient {
    /// Create a new client for a node URL.
    pub fn new(blockchain: &str, url: url::Url, timeout: Duration) -> Self {
        let rendered = url.to_string();
        let provider = ProviderBuilder::new().connect_http(url);

        Self {
            blockchain: blockchain.to_string(),
            provider,
            timeout,
            url: rendered,
        }
    }

    /// Strip the node URL out of a transport error message.
    fn scrub(&self, message: String) -> String {
        message.replace(&self.url, "<rpc-url>")
    }

    /// Blockchain name the client was opened for.
    pub fn blockchain(&self) -> &str {
        &self.blockchain
    }

    /// Run one RPC call under the client timeout.
    async fn call<F, T, E>(&self, method: &str, request: F) -> Result<T, ChainClientError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ChainClientError::RpcError(
                self.scrub(format!("{method} failed: {e}")),
            )),
            Err(_) => Err(ChainClientError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl ChainConnector for ChainClient {
    async fn is_connected(&self) -> bool {
        match self.call("eth_chainId", self.provider.get_chain_id()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(blockchain = %self.blockchain, error = %e, "Node connectivity check failed");
                false
            }
        }
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ChainClientError> {
        self.call(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    async fn gas_price(&self) -> Result<u128, ChainClientError> {
        self.call("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, ChainClientError> {
        self.call("eth_estimateGas", self.provider.estimate_gas(tx))
            .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<String, ChainClientError> {
        let pending = match tokio::time::timeout(
            self.timeout,
            self.provider.send_raw_transaction(&raw),
        )
        .await
        {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => {
                return Err(ChainClientError::TransactionFailed(
                    self.scrub(format!("Failed to send: {e}")),
                ))
            }
            Err(_) => return Err(ChainClientError::Timeout(self.timeout)),
        };

        Ok(format!("{:?}", pending.tx_hash()))
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("RPC request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> RpcConnector {
        RpcConnector::new(
            RpcEndpoint::new("http://127.0.0.1:1/{blockchain}/{access_token}", "token"),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn connect_builds_client_for_valid_chain() {
        assert!(connector().connect("polygon").is_ok());
    }

    #[test]
    fn connect_rejects_malformed_chain_name() {
        let err = connector().connect("poly/gon").err().expect("rejected");
        assert!(matches!(err, ChainClientError::InvalidRpcUrl(_)));
    }

    #[tokio::test]
    async fn unreachable_node_is_not_connected() {
        let url: url::Url = "http://127.0.0.1:1/ethereum".parse().unwrap();
        let client = ChainClient::new("ethereum", url, Duration::from_millis(200));
        assert_eq!(client.blockchain(), "ethereum");
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_node_url() {
        let url: url::Url = "http://127.0.0.1:1/ethereum/secret-token".parse().unwrap();
        let client = ChainClient::new("ethereum", url, Duration::from_secs(5));

        let err = client.gas_price().await.unwrap_err();
        assert!(!err.to_string().contains("secret-token"), "{err}");
    }
}
