//! Client for the Dataforsyningen parish registry.
//!
//! Every lookup returns text: either the formatted result or a formatted
//! error. Nothing here propagates a failure to the caller, because the only
//! consumer is a function-calling channel that can carry nothing but text.
//!
//! # Example
//!
//! ```ignore
//! use sogn_agent::RegistryClient;
//!
//! let registry = RegistryClient::new(reqwest::Client::new());
//! println!("{}", registry.search_by_name("Trinitatis").await);
//! println!("{}", registry.get_details("7003").await);
//! println!("{}", registry.list_parishes(Some("Køben"), 10).await);
//! ```

pub mod format;
mod transport;

pub use transport::{HttpTransport, RegistryTransport};

use crate::parish::ParishRecord;
use log::warn;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Production registry endpoint for parishes.
pub const DEFAULT_BASE_URL: &str = "https://api.dataforsyningen.dk/sogne";

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MIN_LIST_LIMIT: i64 = 1;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Failure talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("resource not found")]
    NotFound,

    #[error("registry responded with HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),
}

/// Clamp a requested page size into the range the registry is asked for.
#[must_use]
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(MIN_LIST_LIMIT, MAX_LIST_LIMIT)
}

/// Registry client. Cheap to share behind an `Arc`; holds no per-call state.
#[derive(Clone, Debug)]
pub struct RegistryClient<T = HttpTransport> {
    transport: T,
    base_url: String,
}

impl RegistryClient<HttpTransport> {
    /// Create a client against the production registry using `client`.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_transport(HttpTransport::new(client))
    }
}

impl<T: RegistryTransport> RegistryClient<T> {
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Point the client at another registry base, e.g. a mirror.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search parishes by (partial) name.
    pub async fn search_by_name(&self, query: &str) -> String {
        let result = match self.search_url(query) {
            Ok(url) => self.fetch::<Option<Vec<ParishRecord>>>(&url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(parishes) => format::search_results(query, &parishes.unwrap_or_default()),
            Err(e) => {
                warn!("Parish search failed (query={query:?}): {e}");
                format!("Error searching for parishes: {e}")
            }
        }
    }

    /// Look up a single parish by its registry code.
    pub async fn get_details(&self, code: &str) -> String {
        let result = match self.details_url(code) {
            Ok(url) => self.fetch::<Option<ParishRecord>>(&url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(parish)) => format::details(&parish),
            Ok(None) | Err(RegistryError::NotFound) => format::not_found(code),
            Err(e) => {
                warn!("Parish lookup failed (code={code:?}): {e}");
                format!("Error getting parish details: {e}")
            }
        }
    }

    /// List parishes, optionally narrowed by a partial name.
    ///
    /// `limit` is clamped into `[1, 100]`. A blank filter is not sent to the
    /// registry, but is still echoed in the response text.
    pub async fn list_parishes(&self, name_filter: Option<&str>, limit: i64) -> String {
        let limit = clamp_limit(limit);
        let result = match self.list_url(name_filter, limit) {
            Ok(url) => self.fetch::<Option<Vec<ParishRecord>>>(&url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(parishes) => format::listing(name_filter, &parishes.unwrap_or_default()),
            Err(e) => {
                warn!("Parish listing failed (filter={name_filter:?}, limit={limit}): {e}");
                format!("Error listing parishes: {e}")
            }
        }
    }

    async fn fetch<R: DeserializeOwned>(&self, url: &Url) -> Result<R, RegistryError> {
        let body = self.transport.get(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn base(&self) -> Result<Url, RegistryError> {
        Url::parse(&self.base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {e}", self.base_url)))
    }

    pub(crate) fn search_url(&self, query: &str) -> Result<Url, RegistryError> {
        let mut url = self.base()?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    pub(crate) fn details_url(&self, code: &str) -> Result<Url, RegistryError> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|()| {
                RegistryError::InvalidUrl(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .push(code);
        Ok(url)
    }

    pub(crate) fn list_url(
        &self,
        name_filter: Option<&str>,
        limit: i64,
    ) -> Result<Url, RegistryError> {
        let mut url = self.base()?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(filter) = name_filter.filter(|f| !f.trim().is_empty()) {
                query.append_pair("q", filter);
            }
            query.append_pair("per_side", &limit.to_string());
        }
        Ok(url)
    }
}
