/// Thin JSON-RPC client over an EIP-1193 provider handle.
mod http;
mod transfer;
mod types;

pub use http::HttpProvider;
pub use types::*;

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde_json::{json, Value};

use crate::chain::Chain;
use crate::provider::{Eip1193Provider, ProviderError};

#[derive(Clone)]
pub struct NetworkClient {
    provider: Arc<dyn Eip1193Provider>,
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient").finish_non_exhaustive()
    }
}

impl NetworkClient {
    pub fn new(provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    pub(crate) async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        tracing::trace!(method, "provider request");
        self.provider.request(method, params).await
    }

    /// Ask the wallet for account access (may prompt the user).
    pub async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let value = self.call("eth_requestAccounts", json!([])).await?;
        let accounts = value
            .as_array()
            .ok_or_else(|| ProviderError::internal(format!("Expected account list, got {value}")))?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        Ok(accounts)
    }

    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let value = self.call("eth_chainId", json!([])).await?;
        parse_quantity(&value)
    }

    pub async fn network(&self) -> Result<NetworkInfo, ProviderError> {
        Ok(NetworkInfo::from_chain_id(self.chain_id().await?))
    }

    /// Ask the wallet to switch to `chain`. Fails with 4902 if the wallet does not know it.
    pub async fn switch_chain(&self, chain: Chain) -> Result<(), ProviderError> {
        self.call(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain.hex_chain_id() }]),
        )
        .await?;
        Ok(())
    }

    /// Query the balance for an address (in wei).
    pub async fn balance(&self, address: &Address) -> Result<U256, ProviderError> {
        let value = self
            .call("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_quantity_u256(&value)
    }
}
