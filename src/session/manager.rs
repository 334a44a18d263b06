//! Session manager
//!
//! Owns the process-wide session store. It is created once at startup and
//! shared (behind an `Arc`) with everything that needs the session; it is
//! never torn down before the process exits.

use super::{
    is_valid_seed_format, Appearance, SeedValidation, Session, Settings, UnsealedSession,
    ValidationStatus,
};
use crate::config::RetryConfig;
use crate::notification::{ErrorCode, FatalErrorKind, Notifications};
use crate::proxy::{self, DaemonApi};
use crate::remote::{RemoteData, RemoteStore};
use crate::{Error, Result};
use reqwest::StatusCode;
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

pub struct SessionManager<D> {
    daemon: Arc<D>,
    store: RemoteStore<Session>,
    notifications: Notifications,
    seed_validation: SeedValidation,
    retry: RetryConfig,
    /// Held across read-modify-write of settings so concurrent updates
    /// cannot overwrite each other.
    settings_lock: Mutex<()>,
}

impl<D: DaemonApi> SessionManager<D> {
    pub fn new(daemon: Arc<D>, notifications: Notifications, retry: RetryConfig) -> Self {
        Self {
            daemon,
            store: RemoteStore::new(),
            notifications,
            seed_validation: SeedValidation::new(),
            retry,
            settings_lock: Mutex::new(()),
        }
    }

    /// Current transport state of the session
    pub fn state(&self) -> RemoteData<Session> {
        self.store.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<RemoteData<Session>> {
        self.store.subscribe()
    }

    pub fn seed_validation(&self) -> &SeedValidation {
        &self.seed_validation
    }

    /// The unsealed session, if the store currently holds one
    pub fn unsealed(&self) -> Option<UnsealedSession> {
        match self.store.unwrap()? {
            Session::UnsealedSession(session) => Some(session),
            _ => None,
        }
    }

    /// Settings of the unsealed session, or the defaults otherwise
    pub fn settings(&self) -> Settings {
        self.unsealed()
            .map(|session| session.settings().clone())
            .unwrap_or_default()
    }

    /// Reload the session from the daemon.
    ///
    /// Failures other than "no session" and "sealed" leave the store in the
    /// error state and raise a fatal notification.
    pub async fn fetch(&self) -> Result<()> {
        self.store.loading();
        self.fetch_session().await
    }

    async fn fetch_session(&self) -> Result<()> {
        let daemon = &*self.daemon;
        let result = proxy::with_retry(
            move || daemon.session_get(),
            self.retry.attempts,
            self.retry.delay(),
        )
        .await;

        match result {
            Ok(data) => {
                info!(handle = %data.identity.metadata.handle, "session unsealed");
                self.store
                    .success(Session::UnsealedSession(UnsealedSession::new(data)));
                Ok(())
            }
            Err(Error::Response(ref e)) if e.status == StatusCode::NOT_FOUND => {
                info!("no session");
                self.store.success(Session::NoSession);
                Ok(())
            }
            Err(Error::Response(ref e)) if e.status == StatusCode::FORBIDDEN => {
                info!("session sealed");
                self.store.success(Session::SealedSession);
                Ok(())
            }
            Err(err) => {
                let err = Arc::new(err);
                error!(error = %err, "failed to load the session");
                self.store.error(Arc::clone(&err));
                self.notifications
                    .set_fatal(FatalErrorKind::Session, err.to_string());
                Err(Error::SessionFetch(err))
            }
        }
    }

    /// Unseal the keystore and reload the session.
    ///
    /// Returns `false` if the daemon rejected the passphrase.
    pub async fn unseal(&self, passphrase: &SecretString) -> Result<bool> {
        match self.daemon.key_store_unseal(passphrase).await {
            Ok(()) => {}
            Err(Error::Response(ref e)) if e.is_incorrect_passphrase() => {
                debug!("incorrect passphrase");
                return Ok(false);
            }
            Err(err) => return Err(err),
        }
        // A failed reload is already in the store and raised as fatal
        if let Err(err) = self.fetch().await {
            debug!(error = %err, "session reload after unseal failed");
        }
        Ok(true)
    }

    pub async fn create_keystore(&self, passphrase: &SecretString) -> Result<()> {
        self.daemon.key_store_create(passphrase).await
    }

    /// Wait until the session is unsealed.
    ///
    /// Resolves immediately if it already is, and fails with the fetch error
    /// if loading the session fails first.
    pub async fn wait_unsealed(&self) -> Result<UnsealedSession> {
        self.store
            .wait_until(|data| match data {
                RemoteData::Success(Session::UnsealedSession(session)) => {
                    Some(Ok(session.clone()))
                }
                RemoteData::Error(err) => Some(Err(Error::SessionFetch(Arc::clone(err)))),
                _ => None,
            })
            .await
            .unwrap_or(Err(Error::StoreClosed))
    }

    pub async fn update_appearance(&self, appearance: Appearance) -> Result<()> {
        self.update_settings(|s| s.with_appearance(appearance))
            .await
            .map(|_| ())
    }

    pub async fn dismiss_remote_helper_hint(&self) -> Result<()> {
        self.update_settings(Settings::with_remote_helper_hint_dismissed)
            .await
            .map(|_| ())
    }

    /// Validate and persist a new seed.
    ///
    /// Returns `false` without touching the settings if the seed is malformed
    /// or already present, or if the daemon did not accept the update.
    pub async fn add_seed(&self, seed: &str) -> Result<bool> {
        let _guard = self.settings_lock.lock().await;
        if !is_valid_seed_format(seed) {
            let status = self.seed_validation.validate(seed, |_| async { true }).await;
            debug!(seed, ?status, "seed rejected");
            return Ok(false);
        }
        let current = self.current_settings()?;

        let status = self
            .seed_validation
            .validate(seed, |seed| {
                let unique = !current.has_seed(seed);
                async move { unique }
            })
            .await;
        if status != ValidationStatus::Success {
            debug!(seed, ?status, "seed rejected");
            return Ok(false);
        }

        self.set_settings(current.with_seed(seed)).await
    }

    /// Remove a seed. The seed validation state is reset however the update
    /// ends.
    pub async fn remove_seed(&self, seed: &str) -> Result<()> {
        let result = self.update_settings(|s| s.without_seed(seed)).await;
        self.seed_validation.reset();
        result.map(|_| ())
    }

    fn current_settings(&self) -> Result<Settings> {
        self.unsealed()
            .map(|session| session.settings().clone())
            .ok_or(Error::NotUnsealed)
    }

    async fn update_settings(&self, update: impl FnOnce(Settings) -> Settings) -> Result<bool> {
        let _guard = self.settings_lock.lock().await;
        let settings = update(self.current_settings()?);
        self.set_settings(settings).await
    }

    /// Send `settings` to the daemon and reload the session.
    ///
    /// A rejected update is shown to the user and dropped; the store is left
    /// untouched. Returns whether the update was applied.
    async fn set_settings(&self, settings: Settings) -> Result<bool> {
        if let Err(err) = self.daemon.session_settings_set(&settings).await {
            warn!(error = %err, "dropping settings update");
            self.notifications.show(
                ErrorCode::SessionSettingsUpdateFailure,
                format!("Failed to update settings: {}", err),
            );
            return Ok(false);
        }

        self.fetch_session().await?;
        Ok(true)
    }
}
