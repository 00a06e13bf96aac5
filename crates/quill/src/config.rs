//! Client configuration.

use std::time::Duration;

use quill_keys::KeyRingConfig;

/// Configuration for a diary client and its HTTP transport.
///
/// Passed explicitly to constructors; there is no process-wide default
/// client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the diary service, without a trailing slash.
    pub base_url: String,

    /// Value of the `User-Agent` header.
    pub user_agent: String,

    /// Bearer token injected as `Authorization` on every request.
    pub api_token: Option<String>,

    /// Timeout for a single HTTP request. Crypto work is not covered.
    pub request_timeout: Duration,

    /// Diary key cache settings.
    pub key_cache: KeyRingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user_agent: concat!("quill/", env!("CARGO_PKG_VERSION")).to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            key_cache: KeyRingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}
