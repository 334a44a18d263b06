//! Signer backed by an external wallet
//!
//! Keys never live in this process. Every signature comes from the wallet on
//! the other end of the bridge; the chain provider is only used to look up
//! nonces and, in the Local environment, to broadcast.

use super::bridge::{BridgeSignRequest, BridgeTransaction, WalletBridge};
use super::provider::ChainProvider;
use super::Environment;
use crate::config::Config;
use crate::{Error, Result};
use alloy::hex;
use alloy::primitives::{eip191_hash_message, Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

/// Gas limit used when the transaction does not set one
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

/// Gas price used when the transaction does not set one
pub const DEFAULT_GAS_PRICE: u128 = 0;

fn encode_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(trimmed)
        .map_err(|e| Error::WalletBridge(format!("Invalid hex string from wallet: {}", e)))
}

/// Transaction relayed through the wallet.
///
/// The wallet only reports the hash, so chain id, nonce, gas and receipt
/// tracking are not available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTransactionReceipt {
    pub hash: B256,
    pub from: Address,
    pub value: U256,
    pub data: Bytes,
    pub confirmations: u64,
}

/// Transaction signed by the wallet and broadcast by us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResponse {
    Broadcast(BroadcastTransaction),
    Relayed(PartialTransactionReceipt),
}

impl TransactionResponse {
    pub fn hash(&self) -> B256 {
        match self {
            TransactionResponse::Broadcast(tx) => tx.hash,
            TransactionResponse::Relayed(tx) => tx.hash,
        }
    }

    pub fn from(&self) -> Address {
        match self {
            TransactionResponse::Broadcast(tx) => tx.from,
            TransactionResponse::Relayed(tx) => tx.from,
        }
    }

    pub fn value(&self) -> U256 {
        match self {
            TransactionResponse::Broadcast(tx) => tx.value,
            TransactionResponse::Relayed(tx) => tx.value,
        }
    }

    pub fn data(&self) -> &Bytes {
        match self {
            TransactionResponse::Broadcast(tx) => &tx.data,
            TransactionResponse::Relayed(tx) => &tx.data,
        }
    }
}

/// Signing capabilities offered to the rest of the application
#[async_trait]
pub trait Signer: Send + Sync {
    async fn address(&self) -> Result<Address>;

    /// EIP-191 personal message signature
    async fn sign_message(&self, message: &[u8]) -> Result<String>;

    /// Returns the signed transaction as hex
    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<String>;

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TransactionResponse>;

    /// Bind the signer to another provider
    fn connect(&self, provider: Arc<dyn ChainProvider>) -> Result<Box<dyn Signer>>;
}

/// Transaction with every field the wallet needs to sign it
#[derive(Debug, Clone)]
struct PreparedTransaction {
    from: Address,
    to: Option<Address>,
    value: U256,
    gas_limit: u64,
    gas_price: u128,
    nonce: u64,
    data: Option<Bytes>,
}

impl PreparedTransaction {
    fn to_bridge_request(&self) -> BridgeSignRequest {
        BridgeSignRequest {
            from: encode_hex_prefixed(self.from.as_slice()),
            to: self.to.map(|to| encode_hex_prefixed(to.as_slice())),
            value: self.value.to_string(),
            gas_limit: self.gas_limit.to_string(),
            gas_price: self.gas_price.to_string(),
            nonce: self.nonce,
            data: self.data.as_ref().map(|d| encode_hex_prefixed(d)),
        }
    }
}

/// [`Signer`] bound to one wallet connection
pub struct WalletConnectSigner {
    bridge: Arc<dyn WalletBridge>,
    provider: Arc<dyn ChainProvider>,
    environment: Environment,
}

impl WalletConnectSigner {
    pub fn new(
        bridge: Arc<dyn WalletBridge>,
        provider: Arc<dyn ChainProvider>,
        environment: Environment,
    ) -> Self {
        Self {
            bridge,
            provider,
            environment,
        }
    }

    /// Signer for the configured environment, using its RPC node
    pub fn from_config(bridge: Arc<dyn WalletBridge>, config: &Config) -> Result<Self> {
        let provider = config.chain_provider()?;
        Ok(Self::new(bridge, Arc::new(provider), config.environment))
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    async fn sender(&self, tx: &TransactionRequest) -> Result<Address> {
        match tx.from {
            Some(from) => Ok(from),
            None => self.address().await,
        }
    }

    async fn prepare(&self, tx: &TransactionRequest) -> Result<PreparedTransaction> {
        let from = self.sender(tx).await?;
        let nonce = self.provider.transaction_count(from).await?;

        Ok(PreparedTransaction {
            from,
            to: tx.to.and_then(|kind| kind.to().copied()),
            value: tx.value.unwrap_or(U256::ZERO),
            gas_limit: tx.gas.unwrap_or(DEFAULT_GAS_LIMIT),
            gas_price: tx.gas_price.unwrap_or(DEFAULT_GAS_PRICE),
            nonce,
            data: tx.input.input().cloned(),
        })
    }

    /// Let the wallet sign and broadcast through our own node
    async fn broadcast(&self, tx: &TransactionRequest) -> Result<TransactionResponse> {
        let prepared = self.prepare(tx).await?;
        let signed = self
            .bridge
            .sign_transaction(prepared.to_bridge_request())
            .await?;
        let hash = self
            .provider
            .send_raw_transaction(&decode_hex(&signed)?)
            .await?;
        let chain_id = self.provider.chain_id().await?;

        tracing::info!(tx_hash = %hash, nonce = prepared.nonce, "Broadcast transaction to local node");

        Ok(TransactionResponse::Broadcast(BroadcastTransaction {
            hash,
            from: prepared.from,
            to: prepared.to,
            value: prepared.value,
            data: prepared.data.unwrap_or_default(),
            nonce: prepared.nonce,
            gas_limit: prepared.gas_limit,
            gas_price: prepared.gas_price,
            chain_id,
        }))
    }

    /// Let the wallet sign and broadcast on its own network
    async fn relay(&self, tx: &TransactionRequest) -> Result<TransactionResponse> {
        let from = self.sender(tx).await?;
        let data = tx.input.input().cloned();

        let hash = self
            .bridge
            .send_transaction(BridgeTransaction {
                from: encode_hex_prefixed(from.as_slice()),
                to: tx
                    .to
                    .and_then(|kind| kind.to().copied())
                    .map(|to| encode_hex_prefixed(to.as_slice())),
                value: tx.value.map(|v| v.to_string()),
                data: data.as_ref().map(|d| encode_hex_prefixed(d)),
            })
            .await?;
        let hash = B256::from_str(&hash)
            .map_err(|e| Error::WalletBridge(format!("Invalid transaction hash {}: {}", hash, e)))?;

        tracing::info!(tx_hash = %hash, environment = %self.environment, "Wallet sent transaction");

        Ok(TransactionResponse::Relayed(PartialTransactionReceipt {
            hash,
            from,
            value: tx.value.unwrap_or(U256::ZERO),
            data: data.unwrap_or_default(),
            confirmations: 1,
        }))
    }
}

#[async_trait]
impl Signer for WalletConnectSigner {
    async fn address(&self) -> Result<Address> {
        self.bridge
            .connection()
            .and_then(|connection| connection.account_address)
            .ok_or(Error::WalletConnection)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String> {
        let address = self.address().await?;
        let hash = eip191_hash_message(message);
        self.bridge
            .sign_message(
                &encode_hex_prefixed(address.as_slice()),
                &encode_hex_prefixed(hash.as_slice()),
            )
            .await
    }

    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<String> {
        let prepared = self.prepare(tx).await?;
        self.bridge
            .sign_transaction(prepared.to_bridge_request())
            .await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TransactionResponse> {
        // In the Local environment the wallet may not even be on a network
        // that reaches our node, so we only ask it to sign.
        match self.environment {
            Environment::Local => self.broadcast(tx).await,
            Environment::Rinkeby | Environment::Mainnet => self.relay(tx).await,
        }
    }

    fn connect(&self, _provider: Arc<dyn ChainProvider>) -> Result<Box<dyn Signer>> {
        Err(Error::Unsupported(
            "WalletConnectSigner is bound to its wallet connection",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::WalletConnection;
    use alloy::primitives::{address, keccak256, Signature};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use std::sync::Mutex;

    // Test private key (DO NOT use in production!)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const SIGNED_TX: &str = "0x02f86c0180843b9aca00";
    const SENT_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
    const BROADCAST_HASH: B256 = B256::repeat_byte(0x22);

    /// Wallet holding the test key
    struct FakeBridge {
        connection: Option<WalletConnection>,
        key: PrivateKeySigner,
        signatures: Mutex<Vec<(String, Signature)>>,
        sent: Mutex<Vec<BridgeTransaction>>,
        sign_requests: Mutex<Vec<BridgeSignRequest>>,
    }

    impl FakeBridge {
        fn connected() -> Arc<Self> {
            Self::with_connection(Some(WalletConnection {
                account_address: Some(TEST_ADDRESS),
                chain_id: 1,
            }))
        }

        fn with_connection(connection: Option<WalletConnection>) -> Arc<Self> {
            Arc::new(Self {
                connection,
                key: TEST_KEY.parse().unwrap(),
                signatures: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                sign_requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WalletBridge for FakeBridge {
        fn connection(&self) -> Option<WalletConnection> {
            self.connection.clone()
        }

        async fn sign_message(&self, address: &str, hash: &str) -> Result<String> {
            let hash = B256::from_str(hash).unwrap();
            let signature = self.key.sign_hash_sync(&hash).unwrap();
            self.signatures
                .lock()
                .unwrap()
                .push((address.to_string(), signature));
            Ok(encode_hex_prefixed(&signature.as_bytes()))
        }

        async fn send_transaction(&self, tx: BridgeTransaction) -> Result<String> {
            self.sent.lock().unwrap().push(tx);
            Ok(SENT_HASH.to_string())
        }

        async fn sign_transaction(&self, tx: BridgeSignRequest) -> Result<String> {
            self.sign_requests.lock().unwrap().push(tx);
            Ok(SIGNED_TX.to_string())
        }
    }

    struct FakeProvider {
        nonce: u64,
        broadcasts: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeProvider {
        fn new(nonce: u64) -> Arc<Self> {
            Arc::new(Self {
                nonce,
                broadcasts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChainProvider for FakeProvider {
        async fn transaction_count(&self, _address: Address) -> Result<u64> {
            Ok(self.nonce)
        }

        async fn chain_id(&self) -> Result<u64> {
            Ok(1337)
        }

        async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
            self.broadcasts.lock().unwrap().push(raw.to_vec());
            Ok(BROADCAST_HASH)
        }
    }

    fn signer(
        bridge: &Arc<FakeBridge>,
        provider: &Arc<FakeProvider>,
        environment: Environment,
    ) -> WalletConnectSigner {
        WalletConnectSigner::new(bridge.clone(), provider.clone(), environment)
    }

    fn transfer() -> TransactionRequest {
        TransactionRequest::default()
            .to(address!("70997970c51812dc3a010c7d01b50e0d17dc79c8"))
            .value(U256::from(1_000_000_000_000_000_000u128))
            .input(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]).into())
    }

    #[tokio::test]
    async fn address_comes_from_connection() {
        let provider = FakeProvider::new(0);
        let signer = signer(&FakeBridge::connected(), &provider, Environment::Mainnet);
        assert_eq!(signer.address().await.unwrap(), TEST_ADDRESS);
    }

    #[tokio::test]
    async fn address_requires_connected_account() {
        let provider = FakeProvider::new(0);
        for connection in [
            None,
            Some(WalletConnection {
                account_address: None,
                chain_id: 1,
            }),
        ] {
            let bridge = FakeBridge::with_connection(connection);
            let signer = signer(&bridge, &provider, Environment::Mainnet);
            assert!(matches!(
                signer.address().await,
                Err(Error::WalletConnection)
            ));
        }
    }

    #[tokio::test]
    async fn sign_message_forwards_eip191_hash() {
        let bridge = FakeBridge::connected();
        let signer = signer(&bridge, &FakeProvider::new(0), Environment::Mainnet);
        let message = b"hello upstream";

        let signature = signer.sign_message(message).await.unwrap();

        let (address, recorded) = bridge.signatures.lock().unwrap()[0].clone();
        assert_eq!(address, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(signature, encode_hex_prefixed(&recorded.as_bytes()));

        let mut preimage = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
        preimage.extend_from_slice(message);
        assert_eq!(
            recorded.recover_address_from_prehash(&keccak256(&preimage)).unwrap(),
            TEST_ADDRESS
        );
    }

    #[tokio::test]
    async fn sign_transaction_fills_defaults_and_nonce() {
        let bridge = FakeBridge::connected();
        let signer = signer(&bridge, &FakeProvider::new(7), Environment::Mainnet);

        let signed = signer.sign_transaction(&transfer()).await.unwrap();

        assert_eq!(signed, SIGNED_TX);
        let request = bridge.sign_requests.lock().unwrap()[0].clone();
        assert_eq!(
            request,
            BridgeSignRequest {
                from: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
                to: Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string()),
                value: "1000000000000000000".to_string(),
                gas_limit: "200000".to_string(),
                gas_price: "0".to_string(),
                nonce: 7,
                data: Some("0xdeadbeef".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn sign_transaction_keeps_explicit_gas() {
        let bridge = FakeBridge::connected();
        let signer = signer(&bridge, &FakeProvider::new(0), Environment::Mainnet);
        let tx = transfer().gas_limit(21_000).gas_price(5);

        signer.sign_transaction(&tx).await.unwrap();

        let request = bridge.sign_requests.lock().unwrap()[0].clone();
        assert_eq!(request.gas_limit, "21000");
        assert_eq!(request.gas_price, "5");
    }

    #[tokio::test]
    async fn local_send_never_uses_wallet_send() {
        let bridge = FakeBridge::connected();
        let provider = FakeProvider::new(3);
        let signer = signer(&bridge, &provider, Environment::Local);

        let response = signer.send_transaction(&transfer()).await.unwrap();

        assert!(bridge.sent.lock().unwrap().is_empty());
        assert_eq!(bridge.sign_requests.lock().unwrap().len(), 1);
        assert_eq!(
            provider.broadcasts.lock().unwrap()[0],
            decode_hex(SIGNED_TX).unwrap()
        );
        match response {
            TransactionResponse::Broadcast(tx) => {
                assert_eq!(tx.hash, BROADCAST_HASH);
                assert_eq!(tx.nonce, 3);
                assert_eq!(tx.chain_id, 1337);
                assert_eq!(tx.gas_limit, DEFAULT_GAS_LIMIT);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn remote_send_goes_through_wallet() {
        for environment in [Environment::Rinkeby, Environment::Mainnet] {
            let bridge = FakeBridge::connected();
            let provider = FakeProvider::new(0);
            let signer = signer(&bridge, &provider, environment);

            let response = signer.send_transaction(&transfer()).await.unwrap();

            assert!(provider.broadcasts.lock().unwrap().is_empty());
            assert_eq!(
                bridge.sent.lock().unwrap()[0],
                BridgeTransaction {
                    from: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
                    to: Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string()),
                    value: Some("1000000000000000000".to_string()),
                    data: Some("0xdeadbeef".to_string()),
                }
            );
            assert_eq!(
                response,
                TransactionResponse::Relayed(PartialTransactionReceipt {
                    hash: B256::from_str(SENT_HASH).unwrap(),
                    from: TEST_ADDRESS,
                    value: U256::from(1_000_000_000_000_000_000u128),
                    data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
                    confirmations: 1,
                })
            );
        }
    }

    #[tokio::test]
    async fn remote_send_prefers_explicit_sender() {
        let bridge = FakeBridge::with_connection(None);
        let signer = signer(&bridge, &FakeProvider::new(0), Environment::Mainnet);
        let sender = address!("3c44cdddb6a900fa2b585dd299e03d12fa4293bc");

        let response = signer
            .send_transaction(&transfer().from(sender))
            .await
            .unwrap();

        assert_eq!(response.from(), sender);
    }

    #[test]
    fn from_config_uses_configured_environment() {
        let mut urls = std::collections::HashMap::new();
        urls.insert(Environment::Local, "http://localhost:8545".to_string());
        let config = Config {
            environment: Environment::Local,
            rpc: crate::config::RpcConfig::with_urls(urls),
            ..Config::default()
        };

        let signer = WalletConnectSigner::from_config(FakeBridge::connected(), &config).unwrap();
        assert_eq!(signer.environment(), Environment::Local);

        let config = Config {
            environment: Environment::Rinkeby,
            ..config
        };
        assert!(matches!(
            WalletConnectSigner::from_config(FakeBridge::connected(), &config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn connect_is_unsupported() {
        let signer = signer(
            &FakeBridge::connected(),
            &FakeProvider::new(0),
            Environment::Mainnet,
        );
        let other: Arc<dyn ChainProvider> = FakeProvider::new(0);
        assert!(matches!(
            signer.connect(other),
            Err(Error::Unsupported(_))
        ));
    }
}
