//! HTTP transport for the registry client.
//!
//! The client never talks to `reqwest` directly; it goes through
//! [`RegistryTransport`] so tests can substitute a scripted transport.

use super::RegistryError;
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use url::Url;

/// Fetches a registry resource and returns the raw response body.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Issue a GET request for `url`.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] for a 404, [`RegistryError::Status`]
    /// for any other non-success status and [`RegistryError::Transport`] when
    /// the request or body read fails.
    async fn get(&self, url: &Url) -> Result<String, RegistryError>;
}

/// [`RegistryTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String, RegistryError> {
        debug!("Registry GET {url}");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("Registry response status={status} url={url}");

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound);
        }
        if !status.is_success() {
            return Err(RegistryError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| RegistryError::Transport(format!("failed to read response body: {e}")))
    }
}
