//! HTTP implementation of [`DaemonApi`]

use super::{DaemonApi, ResponseError};
use crate::session::{SessionData, Settings};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;

/// Client for the daemon's HTTP proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: Client,
    base_url: Url,
}

impl ProxyClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Parse the base URL from a string
    pub fn from_url(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid proxy URL {}: {}", base_url, e)))?;
        Ok(Self::new(url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid proxy endpoint {}: {}", path, e)))
    }

    /// Turn non-success responses into [`ResponseError`]s
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ResponseError::from_body(status, &body);
        tracing::debug!(status = %status, variant = ?err.variant, "daemon request failed");
        Err(err.into())
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DaemonApi for ProxyClient {
    async fn session_get(&self) -> Result<SessionData> {
        let response = self.http.get(self.endpoint("v1/session")?).send().await?;
        let data = Self::check(response).await?.json::<SessionData>().await?;
        Ok(data)
    }

    async fn key_store_unseal(&self, passphrase: &SecretString) -> Result<()> {
        self.post_json(
            "v1/keystore/unseal",
            &json!({ "passphrase": passphrase.expose_secret() }),
        )
        .await
    }

    async fn key_store_create(&self, passphrase: &SecretString) -> Result<()> {
        self.post_json(
            "v1/keystore",
            &json!({ "passphrase": passphrase.expose_secret() }),
        )
        .await
    }

    async fn session_settings_set(&self, settings: &Settings) -> Result<()> {
        self.post_json("v1/session/settings", &serde_json::to_value(settings)?)
            .await
    }
}
