//! Signing abstraction: a capability bound to one account that can submit transfers.
use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::network::{NetworkClient, TransactionRequest};
use crate::provider::ProviderError;

#[async_trait]
pub trait Signer: Send + Sync {
    /// The account this signer authorizes for.
    fn address(&self) -> &Address;

    /// Authorize and submit a transfer, returning the transaction hash once accepted.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, ProviderError>;
}

/// Signer that delegates authorization to the wallet behind the provider.
#[derive(Debug, Clone)]
pub struct AccountSigner {
    client: NetworkClient,
    address: Address,
}

impl AccountSigner {
    pub fn new(client: NetworkClient, address: Address) -> Self {
        Self { client, address }
    }
}

#[async_trait]
impl Signer for AccountSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, ProviderError> {
        self.client.send_transaction(&self.address, tx).await
    }
}
