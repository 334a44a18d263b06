//! Ethereum integration
//!
//! Environments and networks we operate in, token unit conversions, and a
//! signer that delegates to an external wallet.

pub mod bridge;
pub mod provider;
mod signer;
mod units;

pub use bridge::{BridgeSignRequest, BridgeTransaction, WalletBridge, WalletConnection};
pub use provider::{ChainProvider, RpcChainProvider};
pub use signer::{
    BroadcastTransaction, PartialTransactionReceipt, Signer, TransactionResponse,
    WalletConnectSigner, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE,
};
pub use units::{from_base_unit, to_base_unit, TOKEN_DECIMALS};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The Ethereum environments we may connect to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Environment {
    /// A local node for testing and development. The connected wallet may
    /// report Mainnet or Rinkeby, but those are fake networks run locally.
    Local,
    /// Testnet
    Rinkeby,
    #[default]
    Mainnet,
}

impl Environment {
    pub fn name(&self) -> &'static str {
        match self {
            Environment::Local => "Local",
            Environment::Rinkeby => "Rinkeby",
            Environment::Mainnet => "Mainnet",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "rinkeby" => Ok(Environment::Rinkeby),
            "mainnet" => Ok(Environment::Mainnet),
            _ => Err(crate::Error::InvalidArgument(format!(
                "Unknown environment: {}",
                s
            ))),
        }
    }
}

/// Networks a connected wallet may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Rinkeby,
    Mainnet,
    Other,
}

/// The network a wallet must be on to be used in `environment`
pub fn supported_network(environment: Environment) -> Network {
    match environment {
        Environment::Local => Network::Mainnet,
        Environment::Rinkeby => Network::Rinkeby,
        Environment::Mainnet => Network::Mainnet,
    }
}

/// See <https://chainid.network>
pub fn network_from_chain_id(chain_id: u64) -> Network {
    match chain_id {
        1 => Network::Mainnet,
        4 => Network::Rinkeby,
        _ => Network::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_environment_expects_mainnet() {
        assert_eq!(supported_network(Environment::Local), Network::Mainnet);
        assert_eq!(supported_network(Environment::Rinkeby), Network::Rinkeby);
        assert_eq!(supported_network(Environment::Mainnet), Network::Mainnet);
    }

    #[test]
    fn maps_chain_ids() {
        assert_eq!(network_from_chain_id(1), Network::Mainnet);
        assert_eq!(network_from_chain_id(4), Network::Rinkeby);
        assert_eq!(network_from_chain_id(42161), Network::Other);
    }

    #[test]
    fn parses_environment_names() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("Mainnet".parse::<Environment>().unwrap(), Environment::Mainnet);
        assert!("goerli".parse::<Environment>().is_err());
    }

    #[test]
    fn environment_serializes_by_name() {
        assert_eq!(
            serde_json::to_value(Environment::Rinkeby).unwrap(),
            serde_json::json!("Rinkeby")
        );
    }
}
