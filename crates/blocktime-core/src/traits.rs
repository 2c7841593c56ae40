//! Contracts for the external collaborators of the estimation engine.
//!
//! - [`BlockSource`]: request/response block metadata (blocktime-source
//!   implements it over HTTP)
//! - [`BlockFeed`]: push notifications for newly mined blocks (WebSocket
//!   and in-process implementations live in blocktime-source)

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{FeedError, SourceError};
use crate::types::ReferencePoint;

/// Receiving half of a connected feed. Each message is one decoded frame.
/// The channel closes when the underlying transport closes.
pub type FeedReceiver = mpsc::Receiver<Vec<ReferencePoint>>;

/// Read-only access to a block metadata service.
///
/// Responses are treated as unordered sets of reference points to merge.
/// Timeouts and retries are the implementation's concern; every failure is
/// reported once as a [`SourceError`].
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// The most recent blocks known to the service.
    async fn recent_blocks(&self) -> Result<Vec<ReferencePoint>, SourceError>;

    /// A window of consecutive blocks ending at `height` (inclusive).
    async fn blocks_ending_at(&self, height: u64) -> Result<Vec<ReferencePoint>, SourceError>;

    /// Hash of the block at `height`.
    async fn block_hash_at(&self, height: u64) -> Result<String, SourceError>;

    /// A single block looked up by hash.
    async fn block_by_hash(&self, hash: &str) -> Result<ReferencePoint, SourceError>;

    /// A single block looked up by height.
    ///
    /// Default implementation resolves the hash first, then fetches the block.
    async fn block_at(&self, height: u64) -> Result<ReferencePoint, SourceError> {
        let hash = self.block_hash_at(height).await?;
        self.block_by_hash(&hash).await
    }
}

/// Push channel announcing newly mined blocks.
///
/// `connect` performs the handshake and subscription, then hands back a
/// receiver of decoded frames. It does not reconnect on its own: once the
/// receiver closes, the caller decides whether to connect again.
#[async_trait]
pub trait BlockFeed: Send + Sync {
    async fn connect(&self) -> Result<FeedReceiver, FeedError>;

    /// Short transport name for logs.
    fn name(&self) -> &'static str;
}
