// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee-bounded transaction submission.
//!
//! A transfer is only signed and broadcast when the fee recomputed at
//! submission time equals the fee the client was quoted earlier. Any gas
//! price or gas estimate movement in between rejects the submission before
//! the key is used.
//!
//! ## Flow
//!
//! 1. Connectivity check against the node.
//! 2. Nonce lookup and fee re-estimation (same payload as the quote).
//! 3. Strict comparison with the quoted fee.
//! 4. Legacy transaction build with a fixed gas ceiling, local signing.
//! 5. Raw broadcast, returning the transaction hash.
//!
//! Steps 2-5 run under [`retry_on_transient_error`].

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::U256,
    rpc::types::TransactionRequest,
};
use tracing::{info, warn};

use super::client::{ChainClientError, ChainConnector};
use super::erc20::encode_transfer;
use super::fees::quote_transfer;
use super::retry::{retry_on_transient_error, RetryError, RetryPolicy};
use super::signing::sign_transaction;
use super::types::{GasQuote, Transfer, TransferKind, TRANSFER_GAS_LIMIT};

/// Mismatch message for native transfers.
pub const NATIVE_FEE_MISMATCH: &str = "gas fees do not match";

/// Mismatch message for token transfers.
pub const TOKEN_FEE_MISMATCH: &str = "fees do not match";

/// A transfer together with everything needed to sign it.
pub struct TransferSubmission {
    pub transfer: Transfer,
    pub chain_id: u64,
    /// Fee in wei the client accepted from an earlier quote
    pub quoted_fee: U256,
    pub wallet: EthereumWallet,
}

// The wallet holds key material.
impl std::fmt::Debug for TransferSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferSubmission")
            .field("transfer", &self.transfer)
            .field("chain_id", &self.chain_id)
            .field("quoted_fee", &self.quoted_fee)
            .finish_non_exhaustive()
    }
}

/// Errors raised while quoting or submitting a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Request fields missing or malformed.
    #[error("{0}")]
    Validation(String),

    #[error("Failed to connect to blockchain node")]
    ConnectionFailed,

    /// Recomputed fee differs from the quoted one.
    #[error("{0}")]
    FeeMismatch(&'static str),

    /// Node reported a gas estimate and price whose product does not fit in 128 bits.
    #[error("Gas fee {0} out of range")]
    FeeOutOfRange(U256),

    #[error("Exceeded maximum retries with error: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Chain(#[from] ChainClientError),
}

impl From<RetryError<TransferError>> for TransferError {
    fn from(err: RetryError<TransferError>) -> Self {
        match err {
            RetryError::Failed(e) => e,
            RetryError::Exhausted {
                attempts,
                last_error,
            } => TransferError::RetryExhausted {
                attempts,
                last_error,
            },
        }
    }
}

/// Quotes transfers and broadcasts those whose fee still matches the quote.
pub struct TransferSubmitter<'a> {
    connector: &'a dyn ChainConnector,
    retry: RetryPolicy,
}

impl<'a> TransferSubmitter<'a> {
    pub fn new(connector: &'a dyn ChainConnector, retry: RetryPolicy) -> Self {
        Self { connector, retry }
    }

    /// Quote a transfer's fee without signing anything.
    ///
    /// Runs the same connectivity check and retry loop as [`Self::submit`].
    pub async fn quote(&self, transfer: &Transfer) -> Result<GasQuote, TransferError> {
        if !self.connector.is_connected().await {
            return Err(TransferError::ConnectionFailed);
        }

        let quote = retry_on_transient_error(self.retry, || async {
            quote_transfer(self.connector, transfer)
                .await
                .map_err(TransferError::from)
        })
        .await?;

        info!(
            blockchain = %transfer.blockchain,
            gas_estimate = quote.gas_estimate,
            gas_price = quote.gas_price,
            "Transfer fee quoted"
        );
        Ok(quote)
    }

    /// Submit a transfer, returning the transaction hash.
    pub async fn submit(&self, submission: &TransferSubmission) -> Result<String, TransferError> {
        if !self.connector.is_connected().await {
            return Err(TransferError::ConnectionFailed);
        }

        let tx_hash = retry_on_transient_error(self.retry, || self.attempt(submission)).await?;

        info!(
            tx_hash = %tx_hash,
            blockchain = %submission.transfer.blockchain,
            chain_id = submission.chain_id,
            "Transfer broadcast"
        );
        Ok(tx_hash)
    }

    async fn attempt(&self, submission: &TransferSubmission) -> Result<String, TransferError> {
        let transfer = &submission.transfer;

        let nonce = self.connector.transaction_count(transfer.sender).await?;
        let quote = quote_transfer(self.connector, transfer).await?;

        if quote.gas_fee_wei != submission.quoted_fee {
            warn!(
                quoted = %submission.quoted_fee,
                current = %quote.gas_fee_wei,
                blockchain = %transfer.blockchain,
                "Quoted fee no longer matches, refusing to sign"
            );
            return Err(TransferError::FeeMismatch(fee_mismatch_message(
                &transfer.kind,
            )));
        }

        let tx = signing_request(transfer, nonce, quote.gas_price, submission.chain_id);
        let raw = sign_transaction(&submission.wallet, tx).await?;

        Ok(self.connector.send_raw_transaction(raw).await?)
    }
}

fn fee_mismatch_message(kind: &TransferKind) -> &'static str {
    match kind {
        TransferKind::Native { .. } => NATIVE_FEE_MISMATCH,
        TransferKind::Token { .. } => TOKEN_FEE_MISMATCH,
    }
}

/// Build the legacy transaction that gets signed for a transfer.
pub fn signing_request(
    transfer: &Transfer,
    nonce: u64,
    gas_price: u128,
    chain_id: u64,
) -> TransactionRequest {
    let tx = TransactionRequest::default()
        .with_from(transfer.sender)
        .with_nonce(nonce)
        .with_gas_limit(TRANSFER_GAS_LIMIT)
        .with_gas_price(gas_price)
        .with_chain_id(chain_id);

    match &transfer.kind {
        TransferKind::Native { value } => tx.with_to(transfer.receiver).with_value(*value),
        TransferKind::Token { contract, amount } => tx
            .with_to(*contract)
            .with_input(encode_transfer(transfer.receiver, *amount)),
    }
}

/// Parse a human-readable amount to wei (or token units).
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for native currencies)
///
/// # Returns
/// * `Ok(U256)` - Amount in smallest unit
/// * `Err` - If parsing fails
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainClientError> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts.iter().all(|p| p.is_empty()) {
        return Err(ChainClientError::InvalidAmount(format!(
            "Invalid amount format: {amount:?}"
        )));
    }

    let whole = if parts[0].is_empty() && parts.len() == 2 {
        0u128
    } else {
        parse_digits(parts[0])?
    };

    let decimal_part = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(ChainClientError::InvalidAmount(format!(
                "Too many decimal places (max {decimals})"
            )));
        }
        if dec_str.is_empty() {
            0u128
        } else {
            // Pad with zeros to match decimals
            let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
            parse_digits(&padded)?
        }
    } else {
        0u128
    };

    let multiplier = 10u128.pow(decimals as u32);
    let total = whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or_else(|| ChainClientError::InvalidAmount("Amount overflow".to_string()))?;

    Ok(U256::from(total))
}

/// Parse an integer amount already expressed in base units.
pub fn parse_base_units(amount: &str) -> Result<U256, ChainClientError> {
    let amount = amount.trim();
    if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChainClientError::InvalidAmount(format!(
            "Expected a whole number of base units, got {amount:?}"
        )));
    }

    U256::from_str_radix(amount, 10)
        .map_err(|e| ChainClientError::InvalidAmount(e.to_string()))
}

fn parse_digits(digits: &str) -> Result<u128, ChainClientError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChainClientError::InvalidAmount(format!(
            "Invalid number: {digits:?}"
        )));
    }
    digits
        .parse::<u128>()
        .map_err(|_| ChainClientError::InvalidAmount("Amount overflow".to_string()))
}

/// Format wei (or token units) to human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::signing::{create_signer, create_wallet};
    use crate::blockchain::testing::{MockChain, DEV_ADDRESS, DEV_KEY};
    use alloy::primitives::{Address, TxKind};
    use std::time::Duration;

    const GAS: u64 = 21_000;
    const PRICE: u128 = 20_000_000_000;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 5,
            delay: Duration::from_millis(10),
        }
    }

    fn native_submission(quoted_fee: U256) -> TransferSubmission {
        TransferSubmission {
            transfer: Transfer {
                sender: DEV_ADDRESS,
                receiver: Address::repeat_byte(0x42),
                blockchain: "ethereum".to_string(),
                kind: TransferKind::Native {
                    value: parse_amount("0.5", 18).unwrap(),
                },
            },
            chain_id: 1,
            quoted_fee,
            wallet: create_wallet(create_signer(DEV_KEY).unwrap()),
        }
    }

    fn token_submission(quoted_fee: U256) -> TransferSubmission {
        let mut submission = native_submission(quoted_fee);
        submission.transfer.kind = TransferKind::Token {
            contract: Address::repeat_byte(0x77),
            amount: U256::from(1_000_000u64),
        };
        submission
    }

    fn live_fee() -> U256 {
        U256::from(GAS) * U256::from(PRICE)
    }

    #[tokio::test]
    async fn matching_fee_signs_and_broadcasts() {
        let chain = MockChain::new(GAS, PRICE).with_nonce(7);
        let submitter = TransferSubmitter::new(&chain, policy());

        let tx_hash = submitter.submit(&native_submission(live_fee())).await.unwrap();

        assert!(tx_hash.starts_with("0x"));
        assert_eq!(chain.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn off_by_one_fee_is_rejected_before_signing() {
        let chain = MockChain::new(GAS, PRICE);
        let submitter = TransferSubmitter::new(&chain, policy());

        let err = submitter
            .submit(&native_submission(live_fee() + U256::from(1u64)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), NATIVE_FEE_MISMATCH);
        assert!(matches!(err, TransferError::FeeMismatch(_)));
        assert!(chain.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn token_fee_mismatch_uses_token_message() {
        let chain = MockChain::new(GAS, PRICE);
        let submitter = TransferSubmitter::new(&chain, policy());

        let err = submitter
            .submit(&token_submission(U256::ZERO))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), TOKEN_FEE_MISMATCH);
        assert!(chain.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn token_transfer_broadcasts_contract_call() {
        let chain = MockChain::new(GAS, PRICE);
        let submitter = TransferSubmitter::new(&chain, policy());

        submitter
            .submit(&token_submission(live_fee()))
            .await
            .unwrap();

        assert_eq!(chain.broadcasts().len(), 1);
        // Estimation went to the token contract, not the receiver.
        let estimated = chain.estimated();
        assert_eq!(
            estimated[0].to,
            Some(TxKind::Call(Address::repeat_byte(0x77)))
        );
    }

    #[tokio::test]
    async fn unreachable_node_fails_fast() {
        let chain = MockChain::new(GAS, PRICE).disconnected();
        let submitter = TransferSubmitter::new(&chain, policy());

        let err = submitter
            .submit(&native_submission(live_fee()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to connect to blockchain node");
        assert_eq!(chain.estimated().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_rpc_errors_are_retried() {
        let chain = MockChain::new(GAS, PRICE).with_transient_failures(2);
        let submitter = TransferSubmitter::new(&chain, policy());

        submitter
            .submit(&native_submission(live_fee()))
            .await
            .unwrap();

        assert_eq!(chain.broadcasts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_transient_errors_exhaust_retries() {
        let chain = MockChain::new(GAS, PRICE).with_transient_failures(100);
        let submitter = TransferSubmitter::new(&chain, policy());

        let err = submitter
            .submit(&native_submission(live_fee()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::RetryExhausted { attempts: 5, .. }));
        assert!(err.to_string().starts_with("Exceeded maximum retries"));
    }

    #[tokio::test(start_paused = true)]
    async fn quote_retries_and_matches_submission_fee() {
        let chain = MockChain::new(GAS, PRICE).with_transient_failures(1);
        let submitter = TransferSubmitter::new(&chain, policy());
        let submission = native_submission(U256::ZERO);

        let quote = submitter.quote(&submission.transfer).await.unwrap();

        assert_eq!(quote.gas_fee_wei, live_fee());
        assert_eq!(quote.native_currency, "ETH");
        assert_eq!(chain.estimated().len(), 2);
    }

    #[tokio::test]
    async fn quote_requires_connected_node() {
        let chain = MockChain::new(GAS, PRICE).disconnected();
        let submitter = TransferSubmitter::new(&chain, policy());

        let err = submitter
            .quote(&native_submission(U256::ZERO).transfer)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::ConnectionFailed));
    }

    #[test]
    fn signing_request_uses_gas_ceiling_and_quote_price() {
        let submission = native_submission(live_fee());
        let tx = signing_request(&submission.transfer, 3, PRICE, 137);

        assert_eq!(tx.nonce, Some(3));
        assert_eq!(tx.gas, Some(TRANSFER_GAS_LIMIT));
        assert_eq!(tx.gas_price, Some(PRICE));
        assert_eq!(tx.chain_id, Some(137));
        assert_eq!(tx.to, Some(TxKind::Call(Address::repeat_byte(0x42))));
    }

    #[test]
    fn submission_debug_omits_wallet() {
        let rendered = format!("{:?}", native_submission(live_fee()));
        assert!(rendered.contains("TransferSubmission"));
        assert!(!rendered.contains("wallet"));
    }

    #[test]
    fn test_parse_amount_whole() {
        let result = parse_amount("1", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_decimal() {
        let result = parse_amount("1.5", 18).unwrap();
        assert_eq!(result, U256::from(1_500_000_000_000_000_000u64));

        let result = parse_amount("1.0", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_small() {
        let result = parse_amount("0.001", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000u64));

        let result = parse_amount(".25", 18).unwrap();
        assert_eq!(result, U256::from(250_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        for bad in ["", "abc", "1.2.3", "-1", "1e18", "0.0000000000000000001", "."] {
            assert!(parse_amount(bad, 18).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_base_units() {
        assert_eq!(parse_base_units("1000000").unwrap(), U256::from(1_000_000u64));
        assert!(parse_base_units("1.5").is_err());
        assert!(parse_base_units("-3").is_err());
    }

    #[test]
    fn test_format_amount() {
        let one_eth = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_amount(one_eth, 18), "1");

        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_half, 18), "1.5");

        assert_eq!(format_amount(U256::ZERO, 18), "0");
    }
}
