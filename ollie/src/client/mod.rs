//! HTTP client for the inference server.
//!
//! [`Client`] owns the transport, the normalised base URL, and the slot of
//! the currently active [`CancelToken`]. Endpoint operations live in
//! submodules as further `impl Client` blocks.

mod models;
mod request;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::cancel::{CancelSlot, CancelToken};
use crate::config::{ClientConfig, normalize_host};
use crate::error::{Error, Result};

pub use request::Reply;
pub(crate) use request::read_error_body;

/// Async client for the inference server.
///
/// Clones share the transport and the cancellation slot, so
/// [`Client::abort`] on any clone cancels requests issued through all of them.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) base_url: Arc<str>,
    pub(crate) http_client: reqwest::Client,
    cancel: Arc<CancelSlot>,
}

impl Client {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = normalize_host(&config.host)?;
        let headers = header_map(&config.headers)?;

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let http_client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            base_url: base_url.into(),
            http_client,
            cancel: Arc::new(CancelSlot::new()),
        })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Get the normalised base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configuration the client was built from.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the currently active cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.current()
    }

    /// Abort every in-flight request issued under the current token.
    ///
    /// The client stays usable: later requests get a fresh token.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Build the URL of an API path such as `/api/create`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turn the configured header bag into a [`HeaderMap`].
fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))?;
        map.append(name, value);
    }
    Ok(map)
}
