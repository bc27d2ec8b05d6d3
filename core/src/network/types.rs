use alloy_primitives::{Address, TxHash, U256};
use serde_json::Value;

use crate::chain::Chain;
use crate::provider::ProviderError;

/// Network the wallet is currently on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: u64,
}

impl NetworkInfo {
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = Chain::from_chain_id(chain_id)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self { name, chain_id }
    }
}

/// Native-currency transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    /// Amount in wei.
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// `status == 0x1`.
    pub success: bool,
}

impl TransactionReceipt {
    pub(super) fn from_json(value: &Value) -> Result<Self, ProviderError> {
        let hash = value
            .get("transactionHash")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::internal("Receipt is missing transactionHash"))?;
        let transaction_hash = hash
            .parse::<TxHash>()
            .map_err(|e| ProviderError::internal(format!("Invalid transaction hash '{hash}': {e}")))?;
        let block_number = match value.get("blockNumber") {
            Some(v) if !v.is_null() => Some(parse_quantity(v)?),
            _ => None,
        };
        let success = match value.get("status") {
            Some(v) if !v.is_null() => parse_quantity(v)? == 1,
            _ => false,
        };
        Ok(Self {
            transaction_hash,
            block_number,
            success,
        })
    }
}

/// Parse a JSON-RPC hex quantity (`"0x1a"`) into a u64.
pub(crate) fn parse_quantity(value: &Value) -> Result<u64, ProviderError> {
    let s = value
        .as_str()
        .ok_or_else(|| ProviderError::internal(format!("Expected hex quantity, got {value}")))?;
    let digits = strip_hex_prefix(s)?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::internal(format!("Invalid hex quantity '{s}': {e}")))
}

/// Parse a JSON-RPC hex quantity into a U256 (balances, values).
pub(crate) fn parse_quantity_u256(value: &Value) -> Result<U256, ProviderError> {
    let s = value
        .as_str()
        .ok_or_else(|| ProviderError::internal(format!("Expected hex quantity, got {value}")))?;
    let digits = strip_hex_prefix(s)?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::internal(format!("Invalid hex quantity '{s}': {e}")))
}

fn strip_hex_prefix(s: &str) -> Result<&str, ProviderError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| ProviderError::internal(format!("Hex quantity without 0x prefix: '{s}'")))
}
