//! External wallet bridge
//!
//! The bridge connects to a wallet the user controls (over WalletConnect or
//! similar). Requests cross it as JSON with amounts as decimal strings and
//! byte strings as lowercase `0x` hex.

use crate::Result;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Current state of the wallet connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    /// Account selected in the wallet, if it exposes any
    pub account_address: Option<Address>,
    pub chain_id: u64,
}

/// Transaction the wallet should sign and broadcast itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTransaction {
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Fully specified transaction the wallet should only sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSignRequest {
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub value: String,
    pub gas_limit: String,
    pub gas_price: String,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Snapshot of the connection, `None` while disconnected
    fn connection(&self) -> Option<WalletConnection>;

    /// Sign a 32 byte message hash; returns the signature as hex
    async fn sign_message(&self, address: &str, hash: &str) -> Result<String>;

    /// Returns the transaction hash
    async fn send_transaction(&self, tx: BridgeTransaction) -> Result<String>;

    /// Returns the signed, RLP encoded transaction as hex
    async fn sign_transaction(&self, tx: BridgeSignRequest) -> Result<String>;
}
