//! REST API and push-channel endpoint configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Endpoint settings for the platform backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://ops.example.org`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Explicit push-channel URL override (development environments).
    ///
    /// When absent, the push endpoint is derived from `base_url` by
    /// mapping the scheme (`http` → `ws`, `https` → `wss`) and appending
    /// the channel path.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Request timeout for REST calls in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    /// Resolve the push-channel endpoint for an authenticated session.
    ///
    /// The token travels as a query credential, matching the server's
    /// upgrade-time authentication.
    pub fn push_endpoint(&self, token: &str) -> Result<String, AppError> {
        let base = match &self.ws_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let derived = if let Some(rest) = self.base_url.strip_prefix("https://") {
                    format!("wss://{rest}")
                } else if let Some(rest) = self.base_url.strip_prefix("http://") {
                    format!("ws://{rest}")
                } else {
                    return Err(AppError::configuration(format!(
                        "Cannot derive push endpoint from base_url '{}'",
                        self.base_url
                    )));
                };
                format!("{}/ws", derived.trim_end_matches('/'))
            }
        };

        Ok(format!("{base}?token={token}"))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    15
}
