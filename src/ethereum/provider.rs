//! Chain access for the signer
//!
//! The signer needs very little from the chain: the sender's nonce, and in
//! the Local environment a node to broadcast signed transactions to.

use super::Environment;
use crate::config::RpcConfig;
use crate::{Error, Result};
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;

#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Number of transactions sent from `address`, i.e. its next nonce
    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn chain_id(&self) -> Result<u64>;

    /// Broadcast a signed transaction, returning its hash
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;
}

/// [`ChainProvider`] backed by a JSON-RPC node over HTTP
#[derive(Clone)]
pub struct RpcChainProvider {
    rpc_url: url::Url,
    provider: DynProvider,
}

impl RpcChainProvider {
    pub fn new(rpc_url: url::Url) -> Self {
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .erased();
        Self { rpc_url, provider }
    }

    /// Provider for the node configured for `environment`
    pub fn for_environment(rpc_config: &RpcConfig, environment: Environment) -> Result<Self> {
        let rpc_url = rpc_config
            .get(environment)
            .ok_or_else(|| Error::Config(format!("RPC URL not configured for {}", environment)))?;
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
        Ok(Self::new(url))
    }

    pub fn rpc_url(&self) -> &url::Url {
        &self.rpc_url
    }
}

impl std::fmt::Debug for RpcChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainProvider")
            .field("rpc_url", &self.rpc_url.as_str())
            .finish()
    }
}

#[async_trait]
impl ChainProvider for RpcChainProvider {
    async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(|e| Error::Chain(format!("Failed to get transaction count: {}", e)))
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| Error::Chain(format!("Failed to get chain id: {}", e)))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| Error::Chain(format!("Failed to send transaction: {}", e)))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), "Broadcast transaction");
        Ok(*pending.tx_hash())
    }
}
