// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API, and the validation that turns a request body into a typed
//! [`Transfer`] before any network call is made.
//!
//! ## Request Fields
//!
//! Request bodies are deserialized into optional fields so that a missing
//! field yields a `400 Missing required fields` envelope instead of a bare
//! deserialization error. Numeric fields (`amount`, `chain_id`,
//! `calculated_gas_fee`) accept either JSON numbers or decimal strings.
//!
//! ## Model Categories
//!
//! - **Gas quotes**: native and token fee estimation
//! - **Transfers**: fee-bounded native and token submissions

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::blockchain::{
    create_signer, create_wallet, is_zero_address, parse_amount, parse_base_units, GasQuote,
    Transfer, TransferError, TransferKind, TransferSubmission, NATIVE_DECIMALS,
};

// =============================================================================
// Scalar Inputs
// =============================================================================

/// A JSON scalar given either as a number or as a string.
///
/// Numbers keep the digits the client sent, so wei and token base-unit
/// values above `u64::MAX` and small decimals survive intact.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for NumberOrString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(NumberOrString::Number(n)),
            Value::String(s) => Ok(NumberOrString::Text(s)),
            other => Err(D::Error::custom(format!(
                "expected a number or a string, got {other}"
            ))),
        }
    }
}

impl NumberOrString {
    fn as_text(&self) -> String {
        match self {
            NumberOrString::Number(n) => {
                let literal = n.to_string();
                expand_exponent(&literal).unwrap_or(literal)
            }
            NumberOrString::Text(s) => s.trim().to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, NumberOrString::Text(s) if s.trim().is_empty())
    }
}

impl From<&str> for NumberOrString {
    fn from(value: &str) -> Self {
        NumberOrString::Text(value.to_string())
    }
}

impl From<u64> for NumberOrString {
    fn from(value: u64) -> Self {
        NumberOrString::Number(value.into())
    }
}

/// Rewrite an exponent literal such as `1.5e-7` as a plain decimal.
///
/// Returns `None` for literals without an exponent, negative mantissas and
/// exponents beyond any realistic amount; those are parsed as sent.
fn expand_exponent(literal: &str) -> Option<String> {
    let (mantissa, exponent) = literal.split_once(['e', 'E'])?;
    let exponent: i32 = exponent.trim_start_matches('+').parse().ok()?;
    if mantissa.starts_with('-') || exponent.unsigned_abs() > MAX_EXPONENT {
        return None;
    }

    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{whole}{fraction}");
    let point = whole.len() as i64 + i64::from(exponent);

    let expanded = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{int_part}.{frac_part}")
    };

    if expanded.contains('.') {
        Some(expanded.trim_end_matches('0').trim_end_matches('.').to_string())
    } else {
        Some(expanded)
    }
}

/// 10^78 already exceeds `U256::MAX`.
const MAX_EXPONENT: u32 = 80;

// =============================================================================
// Gas Quote Models
// =============================================================================

/// Request to estimate the fee of a native currency transfer.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NativeGasRequest {
    /// Sender address (0x + 40 hex chars).
    pub sender_address: Option<String>,
    /// Receiver address (0x + 40 hex chars).
    pub receiver_address: Option<String>,
    /// Amount in the native major unit (e.g. `"1.5"`).
    #[schema(value_type = Option<String>)]
    pub amount: Option<NumberOrString>,
    /// Blockchain name (e.g. `ethereum`, `polygon`).
    pub blockchain: Option<String>,
}

/// Request to estimate the fee of an ERC-20 token transfer.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TokenGasRequest {
    /// Sender address (0x + 40 hex chars).
    pub sender_address: Option<String>,
    /// Receiver address (0x + 40 hex chars).
    pub receiver_address: Option<String>,
    /// Amount in the token's base units (integer).
    #[schema(value_type = Option<String>)]
    pub amount: Option<NumberOrString>,
    /// Blockchain name (e.g. `ethereum`, `polygon`).
    pub blockchain: Option<String>,
    /// ERC-20 contract address.
    pub token_contract_address: Option<String>,
}

/// Gas fee quote.
///
/// Clients echo `gas_fee_wei` back as `calculated_gas_fee` when submitting.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GasQuoteResponse {
    pub success: bool,
    /// Estimated gas units.
    pub gas_estimate: u64,
    /// Gas price in wei.
    #[schema(value_type = u64)]
    pub gas_price: u128,
    /// Fee in wei (`gas_estimate * gas_price`).
    #[schema(value_type = u64)]
    pub gas_fee_wei: u128,
    /// Fee in the native major unit, exact decimal.
    pub gas_fee_native: String,
    /// Native currency symbol, `UNKNOWN` for unlisted chains.
    pub native_currency: String,
}

impl TryFrom<GasQuote> for GasQuoteResponse {
    type Error = TransferError;

    fn try_from(quote: GasQuote) -> Result<Self, Self::Error> {
        let gas_fee_wei = u128::try_from(quote.gas_fee_wei)
            .map_err(|_| TransferError::FeeOutOfRange(quote.gas_fee_wei))?;

        Ok(Self {
            success: true,
            gas_estimate: quote.gas_estimate,
            gas_price: quote.gas_price,
            gas_fee_wei,
            gas_fee_native: quote.gas_fee_native,
            native_currency: quote.native_currency.to_string(),
        })
    }
}

// =============================================================================
// Transfer Models
// =============================================================================

/// Request to submit a native currency transfer.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct NativeTransferRequest {
    /// Sender address; must match `private_key`.
    pub sender_address: Option<String>,
    /// Hex-encoded secp256k1 private key of the sender.
    pub private_key: Option<String>,
    /// Receiver address.
    pub receiver_address: Option<String>,
    /// Amount in the native major unit (e.g. `"1.5"`).
    #[schema(value_type = Option<String>)]
    pub amount: Option<NumberOrString>,
    /// EIP-155 chain id.
    #[schema(value_type = Option<u64>)]
    pub chain_id: Option<NumberOrString>,
    /// Blockchain name (e.g. `ethereum`, `polygon`).
    pub blockchain: Option<String>,
    /// `gas_fee_wei` from an earlier quote.
    #[schema(value_type = Option<u64>)]
    pub calculated_gas_fee: Option<NumberOrString>,
}

/// Request to submit an ERC-20 token transfer.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct TokenTransferRequest {
    /// Sender address; must match `private_key`.
    pub sender_address: Option<String>,
    /// Hex-encoded secp256k1 private key of the sender.
    pub private_key: Option<String>,
    /// Receiver address.
    pub receiver_address: Option<String>,
    /// Amount in the token's base units (integer).
    #[schema(value_type = Option<String>)]
    pub amount: Option<NumberOrString>,
    /// EIP-155 chain id.
    #[schema(value_type = Option<u64>)]
    pub chain_id: Option<NumberOrString>,
    /// Blockchain name (e.g. `ethereum`, `polygon`).
    pub blockchain: Option<String>,
    /// ERC-20 contract address.
    pub token_contract_address: Option<String>,
    /// `gas_fee_wei` from an earlier quote.
    #[schema(value_type = Option<u64>)]
    pub calculated_gas_fee: Option<NumberOrString>,
}

/// Transfer accepted by the node.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferResponse {
    pub success: bool,
    /// Transaction hash (0x-prefixed hex).
    pub tx_hash: String,
}

impl TransferResponse {
    pub fn new(tx_hash: String) -> Self {
        Self {
            success: true,
            tx_hash,
        }
    }
}

// Private keys must never reach logs.
macro_rules! redacted_debug {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
                    .finish()
            }
        }
    };
}

redacted_debug!(NativeTransferRequest {
    sender_address,
    receiver_address,
    amount,
    chain_id,
    blockchain,
    calculated_gas_fee,
});

redacted_debug!(TokenTransferRequest {
    sender_address,
    receiver_address,
    amount,
    chain_id,
    blockchain,
    token_contract_address,
    calculated_gas_fee,
});

// =============================================================================
// Validation
// =============================================================================

/// Collects the names of missing fields.
#[derive(Default)]
struct RequiredFields(Vec<&'static str>);

impl RequiredFields {
    fn text(mut self, name: &'static str, value: &Option<String>) -> Self {
        if value.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            self.0.push(name);
        }
        self
    }

    fn scalar(mut self, name: &'static str, value: &Option<NumberOrString>) -> Self {
        if value.as_ref().map(NumberOrString::is_blank).unwrap_or(true) {
            self.0.push(name);
        }
        self
    }

    fn check(self) -> Result<(), TransferError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(TransferError::Validation(format!(
                "Missing required fields: {}",
                self.0.join(", ")
            )))
        }
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn scalar(value: &Option<NumberOrString>) -> String {
    value.as_ref().map(NumberOrString::as_text).unwrap_or_default()
}

fn parse_address(field: &str, value: &str) -> Result<Address, TransferError> {
    Address::from_str(value)
        .map_err(|e| TransferError::Validation(format!("Invalid {field}: {e}")))
}

fn reject_zero_addresses(sender: &str, receiver: &str) -> Result<(), TransferError> {
    if is_zero_address(sender) || is_zero_address(receiver) {
        return Err(TransferError::Validation(
            "Invalid sender or receiver address".to_string(),
        ));
    }
    Ok(())
}

fn parse_native_amount(value: &str) -> Result<U256, TransferError> {
    parse_amount(value, NATIVE_DECIMALS).map_err(|e| TransferError::Validation(e.to_string()))
}

fn parse_token_amount(value: &str) -> Result<U256, TransferError> {
    parse_base_units(value).map_err(|e| TransferError::Validation(e.to_string()))
}

fn parse_chain_id(value: &str) -> Result<u64, TransferError> {
    value
        .parse::<u64>()
        .map_err(|_| TransferError::Validation(format!("Invalid chain_id: {value:?}")))
}

fn parse_quoted_fee(value: &str) -> Result<U256, TransferError> {
    parse_base_units(value).map_err(|_| {
        TransferError::Validation(format!("Invalid calculated_gas_fee: {value:?}"))
    })
}

/// Parse the key and make sure it signs for `sender`.
fn sender_wallet(
    private_key: &str,
    sender: Address,
) -> Result<alloy::network::EthereumWallet, TransferError> {
    let signer = create_signer(private_key).map_err(|e| TransferError::Validation(e.to_string()))?;
    if signer.address() != sender {
        return Err(TransferError::Validation(
            "private_key does not belong to sender_address".to_string(),
        ));
    }
    Ok(create_wallet(signer))
}

impl NativeGasRequest {
    pub fn into_transfer(self) -> Result<Transfer, TransferError> {
        RequiredFields::default()
            .text("sender_address", &self.sender_address)
            .text("receiver_address", &self.receiver_address)
            .scalar("amount", &self.amount)
            .text("blockchain", &self.blockchain)
            .check()?;

        Ok(Transfer {
            sender: parse_address("sender_address", text(&self.sender_address))?,
            receiver: parse_address("receiver_address", text(&self.receiver_address))?,
            blockchain: text(&self.blockchain).to_string(),
            kind: TransferKind::Native {
                value: parse_native_amount(&scalar(&self.amount))?,
            },
        })
    }
}

impl TokenGasRequest {
    pub fn into_transfer(self) -> Result<Transfer, TransferError> {
        RequiredFields::default()
            .text("sender_address", &self.sender_address)
            .text("receiver_address", &self.receiver_address)
            .scalar("amount", &self.amount)
            .text("blockchain", &self.blockchain)
            .text("token_contract_address", &self.token_contract_address)
            .check()?;

        Ok(Transfer {
            sender: parse_address("sender_address", text(&self.sender_address))?,
            receiver: parse_address("receiver_address", text(&self.receiver_address))?,
            blockchain: text(&self.blockchain).to_string(),
            kind: TransferKind::Token {
                contract: parse_address(
                    "token_contract_address",
                    text(&self.token_contract_address),
                )?,
                amount: parse_token_amount(&scalar(&self.amount))?,
            },
        })
    }
}

impl NativeTransferRequest {
    pub fn into_submission(self) -> Result<TransferSubmission, TransferError> {
        RequiredFields::default()
            .text("sender_address", &self.sender_address)
            .text("private_key", &self.private_key)
            .text("receiver_address", &self.receiver_address)
            .scalar("amount", &self.amount)
            .scalar("chain_id", &self.chain_id)
            .text("blockchain", &self.blockchain)
            .scalar("calculated_gas_fee", &self.calculated_gas_fee)
            .check()?;

        let sender_raw = text(&self.sender_address);
        let receiver_raw = text(&self.receiver_address);
        reject_zero_addresses(sender_raw, receiver_raw)?;

        let sender = parse_address("sender_address", sender_raw)?;
        let transfer = Transfer {
            sender,
            receiver: parse_address("receiver_address", receiver_raw)?,
            blockchain: text(&self.blockchain).to_string(),
            kind: TransferKind::Native {
                value: parse_native_amount(&scalar(&self.amount))?,
            },
        };

        Ok(TransferSubmission {
            transfer,
            chain_id: parse_chain_id(&scalar(&self.chain_id))?,
            quoted_fee: parse_quoted_fee(&scalar(&self.calculated_gas_fee))?,
            wallet: sender_wallet(text(&self.private_key), sender)?,
        })
    }
}

impl TokenTransferRequest {
    pub fn into_submission(self) -> Result<TransferSubmission, TransferError> {
        RequiredFields::default()
            .text("sender_address", &self.sender_address)
            .text("private_key", &self.private_key)
            .text("receiver_address", &self.receiver_address)
            .scalar("amount", &self.amount)
            .scalar("chain_id", &self.chain_id)
            .text("blockchain", &self.blockchain)
            .text("token_contract_address", &self.token_contract_address)
            .scalar("calculated_gas_fee", &self.calculated_gas_fee)
            .check()?;

        let sender_raw = text(&self.sender_address);
        let receiver_raw = text(&self.receiver_address);
        reject_zero_addresses(sender_raw, receiver_raw)?;

        let sender = parse_address("sender_address", sender_raw)?;
        let transfer = Transfer {
            sender,
            receiver: parse_address("receiver_address", receiver_raw)?,
            blockchain: text(&self.blockchain).to_string(),
            kind: TransferKind::Token {
                contract: parse_address(
                    "token_contract_address",
                    text(&self.token_contract_address),
                )?,
                amount: parse_token_amount(&scalar(&self.amount))?,
            },
        };

        Ok(TransferSubmission {
            transfer,
            chain_id: parse_chain_id(&scalar(&self.chain_id))?,
            quoted_fee: parse_quoted_fee(&scalar(&self.calculated_gas_fee))?,
            wallet: sender_wallet(text(&self.private_key), sender)?,
        })
    }
}
