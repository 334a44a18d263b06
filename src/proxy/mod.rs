//! Client for the local daemon's HTTP proxy
//!
//! The daemon owns identities, the keystore and session settings. This module
//! only knows the request/response contract of the endpoints the session layer
//! needs.

mod client;
mod retry;

pub use client::ProxyClient;
pub use retry::with_retry;

use crate::session::{SessionData, Settings};
use crate::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Error variant the daemon reports for a wrong keystore passphrase
pub const INCORRECT_PASSPHRASE: &str = "INCORRECT_PASSPHRASE";

/// Daemon operations consumed by the session manager
#[async_trait]
pub trait DaemonApi: Send + Sync {
    /// Current session. Fails with 404 if no identity exists and 403 if the
    /// keystore is sealed.
    async fn session_get(&self) -> Result<SessionData>;

    async fn key_store_unseal(&self, passphrase: &SecretString) -> Result<()>;

    async fn key_store_create(&self, passphrase: &SecretString) -> Result<()>;

    async fn session_settings_set(&self, settings: &Settings) -> Result<()>;
}

/// Non-success response returned by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct ResponseError {
    pub status: StatusCode,
    /// Machine readable error tag, e.g. `INCORRECT_PASSPHRASE`
    pub variant: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    variant: Option<String>,
}

impl ResponseError {
    pub fn new(status: StatusCode, variant: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            status,
            variant: variant.map(str::to_string),
            message: message.into(),
        }
    }

    /// Build an error from a response body, which is JSON when the daemon
    /// produced it and arbitrary text otherwise.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self {
                status,
                variant: parsed.variant,
                message: parsed
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            },
            Err(_) => Self {
                status,
                variant: None,
                message: if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("").to_string()
                } else {
                    body.trim().to_string()
                },
            },
        }
    }

    pub fn is_incorrect_passphrase(&self) -> bool {
        self.variant.as_deref() == Some(INCORRECT_PASSPHRASE)
    }
}
