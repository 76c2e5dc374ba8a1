// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas fee estimation for native and ERC-20 transfers.

use alloy::{network::TransactionBuilder, primitives::U256, rpc::types::TransactionRequest};

use super::client::{ChainClientError, ChainConnector};
use super::erc20::encode_transfer;
use super::transactions::format_amount;
use super::types::{native_currency, GasQuote, Transfer, TransferKind, NATIVE_DECIMALS};

/// Build the payload a transfer's fee is estimated against.
///
/// Token transfers carry zeroed gas and gas price so the node estimates the
/// contract call on its own instead of checking the sender's fee balance.
pub fn estimation_request(transfer: &Transfer) -> TransactionRequest {
    match &transfer.kind {
        TransferKind::Native { value } => TransactionRequest::default()
            .from(transfer.sender)
            .to(transfer.receiver)
            .value(*value),
        TransferKind::Token { contract, amount } => TransactionRequest::default()
            .from(transfer.sender)
            .to(*contract)
            .input(encode_transfer(transfer.receiver, *amount).into())
            .with_gas_limit(0)
            .with_gas_price(0),
    }
}

/// Estimate gas for `tx` and price it at the node's current gas price.
pub async fn estimate_fee(
    connector: &dyn ChainConnector,
    tx: TransactionRequest,
    blockchain: &str,
) -> Result<GasQuote, ChainClientError> {
    let gas_estimate = connector.estimate_gas(tx).await?;
    let gas_price = connector.gas_price().await?;

    let gas_fee_wei = U256::from(gas_estimate) * U256::from(gas_price);

    tracing::debug!(
        blockchain,
        gas_estimate,
        gas_price,
        gas_fee_wei = %gas_fee_wei,
        "Estimated transaction fee"
    );

    Ok(GasQuote {
        gas_estimate,
        gas_price,
        gas_fee_wei,
        gas_fee_native: format_amount(gas_fee_wei, NATIVE_DECIMALS),
        native_currency: native_currency(blockchain),
    })
}

/// Quote the fee of a transfer.
pub async fn quote_transfer(
    connector: &dyn ChainConnector,
    transfer: &Transfer,
) -> Result<GasQuote, ChainClientError> {
    estimate_fee(connector, estimation_request(transfer), &transfer.blockchain).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::MockChain;
    use alloy::primitives::{Address, TxKind};

    fn native_transfer(blockchain: &str) -> Transfer {
        Transfer {
            sender: Address::repeat_byte(0x01),
            receiver: Address::repeat_byte(0x02),
            blockchain: blockchain.to_string(),
            kind: TransferKind::Native {
                value: U256::from(10u64).pow(U256::from(18u64)),
            },
        }
    }

    #[tokio::test]
    async fn fee_is_estimate_times_price() {
        let chain = MockChain::new(21_000, 30_000_000_000);
        let quote = quote_transfer(&chain, &native_transfer("ethereum"))
            .await
            .unwrap();

        assert_eq!(quote.gas_estimate, 21_000);
        assert_eq!(quote.gas_price, 30_000_000_000);
        assert_eq!(quote.gas_fee_wei, U256::from(630_000_000_000_000u64));
        assert_eq!(quote.gas_fee_native, "0.00063");
        assert_eq!(quote.native_currency, "ETH");
    }

    #[tokio::test]
    async fn native_fee_rendering_is_exact() {
        // 1 wei fee must not be rounded away.
        let chain = MockChain::new(1, 1);
        let quote = quote_transfer(&chain, &native_transfer("Polygon"))
            .await
            .unwrap();

        assert_eq!(quote.gas_fee_native, "0.000000000000000001");
        assert_eq!(quote.native_currency, "MATIC");
    }

    #[tokio::test]
    async fn unknown_chain_still_quotes() {
        let chain = MockChain::new(21_000, 1);
        let quote = quote_transfer(&chain, &native_transfer("fantom"))
            .await
            .unwrap();
        assert_eq!(quote.native_currency, "UNKNOWN");
    }

    #[tokio::test]
    async fn estimation_errors_propagate() {
        let chain = MockChain::new(21_000, 1).failing_estimates("execution reverted");
        let err = quote_transfer(&chain, &native_transfer("ethereum"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
    }

    #[test]
    fn native_payload_is_a_value_transfer() {
        let transfer = native_transfer("ethereum");
        let tx = estimation_request(&transfer);

        assert_eq!(tx.from, Some(transfer.sender));
        assert_eq!(tx.to, Some(TxKind::Call(transfer.receiver)));
        assert_eq!(tx.value, Some(U256::from(10u64).pow(U256::from(18u64))));
        assert!(tx.gas.is_none());
    }

    #[test]
    fn token_payload_calls_contract_with_zeroed_gas() {
        let contract = Address::repeat_byte(0x33);
        let transfer = Transfer {
            kind: TransferKind::Token {
                contract,
                amount: U256::from(5_000u64),
            },
            ..native_transfer("bsc")
        };
        let tx = estimation_request(&transfer);

        assert_eq!(tx.to, Some(TxKind::Call(contract)));
        assert_eq!(tx.gas, Some(0));
        assert_eq!(tx.gas_price, Some(0));
        assert_eq!(
            tx.input.input().cloned(),
            Some(encode_transfer(transfer.receiver, U256::from(5_000u64)))
        );
    }
}
