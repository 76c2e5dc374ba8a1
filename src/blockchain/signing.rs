// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction signing with caller-supplied private keys.
//!
//! Keys arrive hex-encoded in the request body. They are parsed into an
//! in-memory signer for the duration of one request and never persisted
//! or logged.

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    primitives::Bytes,
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};

use super::client::ChainClientError;

/// Create a signer from a private key (hex string, `0x` prefix optional).
///
/// # Arguments
/// * `private_key_hex` - Hex-encoded private key (64 characters)
///
/// # Returns
/// A `PrivateKeySigner` that can be used to sign transactions.
pub fn create_signer(private_key_hex: &str) -> Result<PrivateKeySigner, ChainClientError> {
    // Use alloy's hex decoding (from alloy-primitives)
    let key_bytes = alloy::hex::decode(private_key_hex.trim())
        .map_err(|e| ChainClientError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ChainClientError::InvalidPrivateKey(e.to_string()))
}

/// Create an Ethereum wallet from a signer.
pub fn create_wallet(signer: PrivateKeySigner) -> EthereumWallet {
    EthereumWallet::from(signer)
}

/// Sign a fully populated transaction request and return its EIP-2718 bytes.
///
/// The request must carry nonce, gas limit, gas price, destination and
/// sender; a request with `gas_price` set is built as a legacy transaction.
pub async fn sign_transaction(
    wallet: &EthereumWallet,
    tx: TransactionRequest,
) -> Result<Bytes, ChainClientError> {
    let envelope = tx
        .build(wallet)
        .await
        .map_err(|e| ChainClientError::SigningFailed(e.to_string()))?;

    Ok(envelope.encoded_2718().into())
}
