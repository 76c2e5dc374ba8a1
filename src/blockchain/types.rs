// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{Address, U256};

use super::client::ChainClientError;

/// Decimals of the native currency on every supported EVM chain.
pub const NATIVE_DECIMALS: u8 = 18;

/// Gas limit ceiling placed on every signed transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 2_000_000;

/// The all-zero address, never accepted as sender or receiver.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Symbol returned for chains missing from [`NATIVE_CURRENCIES`].
pub const UNKNOWN_CURRENCY: &str = "UNKNOWN";

/// Known blockchains and their native currency symbols.
pub const NATIVE_CURRENCIES: &[(&str, &str)] = &[
    ("ethereum", "ETH"),
    ("polygon", "MATIC"),
    ("bsc", "BNB"),
    ("avalanche", "AVAX"),
    ("optimism", "OP"),
];

/// Resolve the native currency symbol for a blockchain name (case-insensitive).
pub fn native_currency(blockchain: &str) -> &'static str {
    let name = blockchain.trim().to_ascii_lowercase();
    NATIVE_CURRENCIES
        .iter()
        .find(|(chain, _)| *chain == name)
        .map(|(_, symbol)| *symbol)
        .unwrap_or(UNKNOWN_CURRENCY)
}

/// Whether an address string is the all-zero address.
pub fn is_zero_address(address: &str) -> bool {
    address.trim().eq_ignore_ascii_case(ZERO_ADDRESS)
}

/// RPC endpoint template shared by all chains.
///
/// The template carries `{blockchain}` and `{access_token}` placeholders, e.g.
/// `https://rpc.ankr.com/{blockchain}/{access_token}`.
#[derive(Clone)]
pub struct RpcEndpoint {
    template: String,
    access_token: String,
}

impl RpcEndpoint {
    pub const BLOCKCHAIN_PLACEHOLDER: &'static str = "{blockchain}";
    pub const ACCESS_TOKEN_PLACEHOLDER: &'static str = "{access_token}";

    pub fn new(template: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            access_token: access_token.into(),
        }
    }

    /// Build the node URL for a blockchain.
    ///
    /// Blockchain names are restricted to lowercase alphanumerics, `-` and `_`
    /// so a request cannot rewrite the path or host of the provider URL.
    pub fn url_for(&self, blockchain: &str) -> Result<url::Url, ChainClientError> {
        let name = blockchain.trim().to_ascii_lowercase();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ChainClientError::InvalidRpcUrl(format!(
                "Unsupported blockchain name: {blockchain}"
            )));
        }

        let raw = self
            .template
            .replace(Self::BLOCKCHAIN_PLACEHOLDER, &name)
            .replace(Self::ACCESS_TOKEN_PLACEHOLDER, &self.access_token);

        raw.parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))
    }
}

// The access token is a secret; keep it out of logs.
impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("template", &self.template)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Gas quote for a prospective transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasQuote {
    /// Estimated gas units
    pub gas_estimate: u64,
    /// Gas price in wei per unit
    pub gas_price: u128,
    /// `gas_estimate * gas_price` in wei
    pub gas_fee_wei: U256,
    /// Fee rendered exactly in the native major unit
    pub gas_fee_native: String,
    /// Native currency symbol
    pub native_currency: &'static str,
}

/// What a transfer moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferKind {
    /// Native currency, amount in wei.
    Native { value: U256 },
    /// ERC-20 `transfer(receiver, amount)`, amount in token base units.
    Token { contract: Address, amount: U256 },
}

/// A validated transfer, ready for quoting or submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub sender: Address,
    pub receiver: Address,
    pub blockchain: String,
    pub kind: TransferKind,
}
