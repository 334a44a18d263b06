//! Application-wide notifications
//!
//! Errors that the user has to see are published here instead of being
//! returned to whoever happened to trigger them. A fatal notification means
//! the application cannot continue without a restart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of notifications buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 32;

/// Subsystem whose failure made the application unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FatalErrorKind {
    Session,
}

/// Codes for errors shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SessionFetchFailure,
    SessionSettingsUpdateFailure,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The application needs a restart
    Fatal {
        kind: FatalErrorKind,
        message: String,
        at: DateTime<Utc>,
    },
    /// Dismissible error message
    Error {
        id: Uuid,
        code: ErrorCode,
        message: String,
        at: DateTime<Utc>,
    },
}

/// Sending half of the notification channel.
///
/// Cloning shares the same channel. Notifications sent while nobody is
/// subscribed are dropped.
#[derive(Debug, Clone)]
pub struct Notifications {
    tx: broadcast::Sender<Notification>,
}

impl Notifications {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn set_fatal(&self, kind: FatalErrorKind, message: impl Into<String>) {
        let _ = self.tx.send(Notification::Fatal {
            kind,
            message: message.into(),
            at: Utc::now(),
        });
    }

    /// Show a dismissible error, returning its id
    pub fn show(&self, code: ErrorCode, message: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        let _ = self.tx.send(Notification::Error {
            id,
            code,
            message: message.into(),
            at: Utc::now(),
        });
        id
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
