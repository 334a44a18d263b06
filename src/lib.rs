//! Upstream client core
//!
//! Session and wallet-signing layer of the Upstream desktop client:
//! - Tracks the daemon session (missing, sealed or unsealed) in a reactive store
//! - Unseals and creates the keystore, and edits user settings
//! - Validates seed addresses before they are added to the peer configuration
//! - Signs messages and transactions through an external wallet
//!
//! # Security Model
//!
//! - Passphrases are only held as `SecretString` and never logged
//! - Private keys never enter this process; the wallet bridge signs

pub mod config;
pub mod ethereum;
pub mod notification;
pub mod proxy;
pub mod remote;
pub mod session;

mod error;

// Re-export commonly used types
pub use config::{Config, RetryConfig, RpcConfig};
pub use error::{Error, Result};
pub use notification::{Notification, Notifications};
pub use remote::{RemoteData, RemoteStore};
pub use session::{Session, SessionManager, Settings, UnsealedSession};
