//! Chain RPC endpoint configuration
//!
//! One endpoint per Ethereum environment, resolved from the environment:
//! 1. Per-environment env vars (LOCAL_RPC_URL, RINKEBY_RPC_URL, ETH_RPC_URL)
//! 2. Provider API keys (ALCHEMY_API_KEY, INFURA_API_KEY)
//! 3. Fallbacks: a local node on port 8545 and a public mainnet RPC
//!
//! # Examples
//!
//! ```bash
//! export LOCAL_RPC_URL="http://localhost:8545"
//! export INFURA_API_KEY="YOUR_KEY"
//! ```

use crate::ethereum::Environment;
use std::collections::HashMap;

/// Environment variable names
mod env_vars {
    pub const LOCAL_RPC_URL: &str = "LOCAL_RPC_URL";
    pub const RINKEBY_RPC_URL: &str = "RINKEBY_RPC_URL";
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";

    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
    pub const INFURA_API_KEY: &str = "INFURA_API_KEY";
}

mod fallbacks {
    pub const LOCAL: &str = "http://localhost:8545";
    /// Rate limited, for testing only
    pub const MAINNET: &str = "https://eth.llamarpc.com";
}

/// RPC endpoints indexed by environment
#[derive(Debug, Clone)]
pub struct RpcConfig {
    urls: HashMap<Environment, String>,
}

impl RpcConfig {
    pub fn from_env() -> Self {
        let mut urls = HashMap::new();

        for (environment, var) in [
            (Environment::Local, env_vars::LOCAL_RPC_URL),
            (Environment::Rinkeby, env_vars::RINKEBY_RPC_URL),
            (Environment::Mainnet, env_vars::ETH_RPC_URL),
        ] {
            if let Ok(url) = std::env::var(var) {
                tracing::debug!("Using {} for {}", var, environment);
                urls.insert(environment, url);
            }
        }

        if let Ok(key) = std::env::var(env_vars::ALCHEMY_API_KEY) {
            tracing::info!("Building missing RPC URLs from ALCHEMY_API_KEY");
            urls.entry(Environment::Mainnet)
                .or_insert_with(|| format!("https://eth-mainnet.g.alchemy.com/v2/{}", key));
            urls.entry(Environment::Rinkeby)
                .or_insert_with(|| format!("https://eth-rinkeby.alchemyapi.io/v2/{}", key));
        }

        if let Ok(key) = std::env::var(env_vars::INFURA_API_KEY) {
            tracing::info!("Building missing RPC URLs from INFURA_API_KEY");
            urls.entry(Environment::Mainnet)
                .or_insert_with(|| format!("https://mainnet.infura.io/v3/{}", key));
            urls.entry(Environment::Rinkeby)
                .or_insert_with(|| format!("https://rinkeby.infura.io/v3/{}", key));
        }

        if !urls.contains_key(&Environment::Mainnet) {
            tracing::warn!("No RPC configured for Mainnet, using public RPC (rate limited)");
        }
        urls.entry(Environment::Mainnet)
            .or_insert_with(|| fallbacks::MAINNET.to_string());
        urls.entry(Environment::Local)
            .or_insert_with(|| fallbacks::LOCAL.to_string());

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<Environment, String>) -> Self {
        Self { urls }
    }

    pub fn get(&self, environment: Environment) -> Option<&str> {
        self.urls.get(&environment).map(|s| s.as_str())
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
