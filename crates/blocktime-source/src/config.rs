//! Transport configuration for the block metadata service.

use std::time::Duration;

/// Default REST API base.
pub const DEFAULT_API_BASE: &str = "https://mempool.space/api/";

/// Default WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://mempool.space/api/v1/ws";

/// Endpoints and HTTP settings for [`MempoolClient`](crate::MempoolClient)
/// and [`MempoolFeed`](crate::MempoolFeed).
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// REST API base URL. A trailing slash is added when missing.
    pub api_base: String,
    /// WebSocket URL for new-block notifications.
    pub ws_url: String,
    /// Per-request timeout for HTTP calls.
    pub request_timeout: Duration,
    /// `User-Agent` header sent with HTTP requests.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("blocktime/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SourceConfig {
    /// Override the defaults from `BLOCKTIME_API_BASE`, `BLOCKTIME_WS_URL`
    /// and `BLOCKTIME_TIMEOUT_SECS`. Unparseable timeouts fall back to the
    /// default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let request_timeout = std::env::var("BLOCKTIME_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            api_base: std::env::var("BLOCKTIME_API_BASE").unwrap_or(defaults.api_base),
            ws_url: std::env::var("BLOCKTIME_WS_URL").unwrap_or(defaults.ws_url),
            request_timeout,
            user_agent: defaults.user_agent,
        }
    }

    /// `api_base` with exactly one trailing slash.
    pub fn normalized_api_base(&self) -> String {
        format!("{}/", self.api_base.trim_end_matches('/'))
    }
}
