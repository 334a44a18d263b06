//! Configuration for the session and wallet layer

pub mod rpc;

use crate::ethereum::{Environment, RpcChainProvider};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Overrides `proxy_url`
pub const PROXY_URL_ENV: &str = "UPSTREAM_PROXY_URL";

/// Keystore passphrase used when none is passed on the command line
pub const PASSPHRASE_ENV: &str = "UPSTREAM_PASSPHRASE";

pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:17246/";

/// Retry budget for reaching the daemon while it starts up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 100,
            delay_ms: 50,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the daemon's HTTP proxy
    pub proxy_url: String,
    /// Retry settings for session requests
    #[serde(default)]
    pub retry: RetryConfig,
    /// Ethereum environment used for signing and sending
    #[serde(default)]
    pub environment: Environment,
    /// Chain RPC endpoints, read from the environment. Never serialized
    /// since the URLs may embed API keys.
    #[serde(skip)]
    pub rpc: RpcConfig,
}

impl Config {
    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `path` if given, otherwise use defaults, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(PROXY_URL_ENV) {
            tracing::debug!(url = %url, "Using {} for the daemon proxy", PROXY_URL_ENV);
            self.proxy_url = url;
        }
        self
    }

    /// Chain provider for the configured environment
    pub fn chain_provider(&self) -> Result<RpcChainProvider> {
        RpcChainProvider::for_environment(&self.rpc, self.environment)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            retry: RetryConfig::default(),
            environment: Environment::default(),
            rpc: RpcConfig::default(),
        }
    }
}
