//! HTTP client for a mempool.space-compatible block API.
//!
//! Four endpoints are used, all relative to the configured API base:
//!
//! | Call                 | Path                |
//! |----------------------|---------------------|
//! | `recent_blocks`      | `v1/blocks/`        |
//! | `blocks_ending_at`   | `v1/blocks/{h}`     |
//! | `block_hash_at`      | `block-height/{h}`  |
//! | `block_by_hash`      | `block/{hash}`      |

use async_trait::async_trait;
use blocktime_core::error::SourceError;
use blocktime_core::traits::BlockSource;
use blocktime_core::types::ReferencePoint;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::SourceConfig;
use crate::protocol::WireBlock;

/// [`BlockSource`] backed by the mempool.space REST API.
#[derive(Debug, Clone)]
pub struct MempoolClient {
    client: Client,
    base: String,
}

impl MempoolClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// [`SourceError::Http`] if the TLS backend cannot be initialized.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base: config.normalized_api_base(),
        })
    }

    /// Absolute URL for a path relative to the API base.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SourceError> {
        let url = self.url(path);
        debug!(%url, "source: GET");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let body = self
            .get(path)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }

    async fn get_blocks(&self, path: &str) -> Result<Vec<ReferencePoint>, SourceError> {
        let blocks: Vec<WireBlock> = self.get_json(path).await?;
        if blocks.is_empty() {
            return Err(SourceError::EmptyResponse(self.url(path)));
        }
        Ok(blocks.into_iter().map(ReferencePoint::from).collect())
    }
}

#[async_trait]
impl BlockSource for MempoolClient {
    async fn recent_blocks(&self) -> Result<Vec<ReferencePoint>, SourceError> {
        self.get_blocks("v1/blocks/").await
    }

    async fn blocks_ending_at(&self, height: u64) -> Result<Vec<ReferencePoint>, SourceError> {
        self.get_blocks(&format!("v1/blocks/{height}")).await
    }

    async fn block_hash_at(&self, height: u64) -> Result<String, SourceError> {
        let path = format!("block-height/{height}");
        let text = self
            .get(&path)
            .await?
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        let hash = text.trim();
        if hash.is_empty() {
            return Err(SourceError::EmptyResponse(self.url(&path)));
        }
        Ok(hash.to_string())
    }

    async fn block_by_hash(&self, hash: &str) -> Result<ReferencePoint, SourceError> {
        let block: WireBlock = self.get_json(&format!("block/{hash}")).await?;
        Ok(block.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> MempoolClient {
        MempoolClient::new(&SourceConfig {
            api_base: base.to_string(),
            ..SourceConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn urls_join_without_double_slash() {
        let c = client("https://mempool.space/api");
        assert_eq!(c.url("v1/blocks/"), "https://mempool.space/api/v1/blocks/");
        assert_eq!(c.url("/block-height/5"), "https://mempool.space/api/block-height/5");
    }

    #[test]
    fn default_base_is_kept() {
        let c = client(crate::config::DEFAULT_API_BASE);
        assert_eq!(c.url("block/abc"), "https://mempool.space/api/block/abc");
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let c = MempoolClient::new(&SourceConfig {
            api_base: "http://127.0.0.1:1/api/".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            ..SourceConfig::default()
        })
        .unwrap();
        assert!(matches!(c.recent_blocks().await, Err(SourceError::Http(_))));
    }
}
