//! Session state
//!
//! The session is either missing, sealed (the keystore exists but is
//! locked), or unsealed. Only the unsealed variant carries the user's
//! identity and settings.

mod manager;
mod settings;
mod validation;

pub use manager::SessionManager;
pub use settings::{Appearance, CoCo, CodeFont, Hints, Settings, Theme, UiFont};
pub use validation::{
    is_valid_seed_format, SeedValidation, ValidationStatus, DUPLICATE_SEED_MESSAGE,
    INVALID_FORMAT_MESSAGE, VALID_SEED_PATTERN,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    NoSession,
    SealedSession,
    UnsealedSession,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub handle: String,
}

/// The local user's identity as reported by the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub urn: String,
    pub peer_id: String,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_fallback: Option<serde_json::Value>,
}

/// Payload of the daemon's session endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub identity: Identity,
    pub settings: Settings,
}

/// Proof that the session was unsealed when this value was obtained.
///
/// Only [`SessionManager`] hands these out, so functions that need an
/// unsealed session take one as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnsealedSession {
    data: SessionData,
}

impl UnsealedSession {
    pub(crate) fn new(data: SessionData) -> Self {
        Self { data }
    }

    pub fn identity(&self) -> &Identity {
        &self.data.identity
    }

    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    NoSession,
    SealedSession,
    UnsealedSession(UnsealedSession),
}

impl Session {
    pub fn status(&self) -> Status {
        match self {
            Session::NoSession => Status::NoSession,
            Session::SealedSession => Status::SealedSession,
            Session::UnsealedSession(_) => Status::UnsealedSession,
        }
    }
}
