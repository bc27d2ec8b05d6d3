use std::time::Duration;

use alloy_primitives::{Address, TxHash};
use serde_json::{json, Value};

use super::types::{parse_quantity, TransactionReceipt, TransactionRequest};
use super::NetworkClient;
use crate::provider::ProviderError;

impl NetworkClient {
    /// Submit a native transfer from `from`. Returns once the wallet hands back a hash.
    pub async fn send_transaction(
        &self,
        from: &Address,
        tx: &TransactionRequest,
    ) -> Result<TxHash, ProviderError> {
        let params = json!([{
            "from": from.to_string(),
            "to": tx.to.to_string(),
            "value": format!("0x{:x}", tx.value),
        }]);
        let value = self.call("eth_sendTransaction", params).await?;
        let hash = value
            .as_str()
            .ok_or_else(|| ProviderError::internal(format!("Expected transaction hash, got {value}")))?;
        hash.parse::<TxHash>()
            .map_err(|e| ProviderError::internal(format!("Invalid transaction hash '{hash}': {e}")))
    }

    pub async fn transaction_receipt(
        &self,
        hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let value = self
            .call("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        TransactionReceipt::from_json(&value).map(Some)
    }

    pub async fn block_number(&self) -> Result<u64, ProviderError> {
        let value: Value = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&value)
    }

    /// Poll until the transaction is included with at least `confirmations` blocks.
    /// A receipt counts as one confirmation; deeper confirmation also checks the head.
    pub async fn wait_for_receipt(
        &self,
        hash: &TxHash,
        confirmations: u64,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt, ProviderError> {
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                if confirmations <= 1 {
                    return Ok(receipt);
                }
                if let Some(included) = receipt.block_number {
                    let head = self.block_number().await?;
                    if head.saturating_sub(included) + 1 >= confirmations {
                        return Ok(receipt);
                    }
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
