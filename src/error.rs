//! Error types for the session and wallet layer

use crate::proxy::ResponseError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Daemon unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Daemon responded with an error: {0}")]
    Response(#[from] ResponseError),

    #[error("Failed to load the session: {0}")]
    SessionFetch(#[source] Arc<Error>),

    #[error("Session is not unsealed")]
    NotUnsealed,

    #[error("Session store closed")]
    StoreClosed,

    #[error("The connected wallet has no accounts or there is a connection problem")]
    WalletConnection,

    #[error("Wallet bridge error: {0}")]
    WalletBridge(String),

    #[error("Chain provider error: {0}")]
    Chain(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure happened before the daemon produced a response.
    ///
    /// Only these are worth retrying while the daemon is still starting up.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
