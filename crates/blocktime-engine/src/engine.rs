//! The [`BlockTime`] facade: one explicitly constructed engine instance
//! owning the shared index, the refinement coordinator, the optional live
//! listener and the formatter.

use std::io::Read;
use std::sync::Arc;

use blocktime_core::baseline::baseline_index;
use blocktime_core::constants::{DEFAULT_NUMBER_SEPARATOR, MILLIS_PER_SECOND, SECONDS_PER_MINUTE};
use blocktime_core::error::{BlockTimeError, SnapshotError};
use blocktime_core::format::FormatEngine;
use blocktime_core::snapshot::Snapshot;
use blocktime_core::traits::{BlockFeed, BlockSource};
use blocktime_core::types::{LocalLookup, ReferencePoint, Resolution};
use blocktime_core::{HistoryIndex, SharedHistory};
use blocktime_source::{MempoolClient, MempoolFeed};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::EngineConfig;
use crate::coordinator::RefinementCoordinator;
use crate::listener::{ListenerState, LiveUpdateListener};

/// Timestamp to block height estimation with halving-aware formatting.
pub struct BlockTime {
    history: SharedHistory,
    coordinator: RefinementCoordinator,
    listener: Option<LiveUpdateListener>,
    formatter: FormatEngine,
}

impl BlockTime {
    /// Build an engine seeded with the mainnet baseline sample.
    ///
    /// Without a `source` the engine is offline regardless of `config`.
    /// Without a `feed`, [`listen`](Self::listen) is unavailable.
    pub fn new(
        config: &EngineConfig,
        source: Option<Arc<dyn BlockSource>>,
        feed: Option<Arc<dyn BlockFeed>>,
    ) -> Self {
        Self::with_index(config, baseline_index(), source, feed)
    }

    /// Build an engine over a caller-supplied index instead of the baseline.
    /// Use this for chains other than mainnet.
    pub fn with_index(
        config: &EngineConfig,
        index: HistoryIndex,
        source: Option<Arc<dyn BlockSource>>,
        feed: Option<Arc<dyn BlockFeed>>,
    ) -> Self {
        let history = index.into_shared();
        let coordinator = RefinementCoordinator::new(history.clone(), source, config);
        let listener = feed.map(|feed| LiveUpdateListener::new(history.clone(), feed));
        info!(
            online = coordinator.is_online(),
            entries = history.read().len(),
            "engine: initialised"
        );
        Self {
            history,
            coordinator,
            listener,
            formatter: FormatEngine::new(),
        }
    }

    /// An engine that answers from the baseline and caller-loaded data only.
    pub fn offline() -> Self {
        Self::new(&EngineConfig::offline(), None, None)
    }

    /// An engine talking to a mempool.space-compatible service over HTTP,
    /// with live updates over WebSocket.
    ///
    /// # Errors
    ///
    /// [`BlockTimeError::Source`] if the HTTP client cannot be built.
    pub fn with_mempool(config: &EngineConfig) -> Result<Self, BlockTimeError> {
        let source: Arc<dyn BlockSource> = Arc::new(MempoolClient::new(&config.source)?);
        let feed: Arc<dyn BlockFeed> = Arc::new(MempoolFeed::new(config.source.ws_url.clone()));
        Ok(Self::new(config, Some(source), Some(feed)))
    }

    /// Sync the recent blocks and subscribe to new ones, when online.
    pub async fn start(&self) -> Result<(), BlockTimeError> {
        if !self.is_online() {
            return Ok(());
        }
        self.sync().await?;
        if self.listener.is_some() {
            self.listen().await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Height of the block most recently mined at or before `timestamp`
    /// (Unix seconds).
    ///
    /// Blocks whose timestamps run backwards relative to their ancestors can
    /// stall refinement, which surfaces as a divergence error. See
    /// [`RefinementCoordinator::resolve`](crate::RefinementCoordinator::resolve).
    pub async fn resolve(&self, timestamp: i64) -> Result<Resolution, BlockTimeError> {
        Ok(self.coordinator.resolve(timestamp).await?)
    }

    /// [`resolve`](Self::resolve) for a millisecond timestamp, floored to
    /// whole seconds.
    pub async fn resolve_millis(&self, millis: i64) -> Result<Resolution, BlockTimeError> {
        self.resolve(millis.div_euclid(MILLIS_PER_SECOND)).await
    }

    /// [`resolve`](Self::resolve) for a timestamp in whole minutes.
    pub async fn resolve_minutes(&self, minutes: i64) -> Result<Resolution, BlockTimeError> {
        let seconds = minutes.checked_mul(SECONDS_PER_MINUTE).ok_or_else(|| {
            BlockTimeError::Config(format!("minute timestamp out of range: {minutes}"))
        })?;
        self.resolve(seconds).await
    }

    pub async fn resolve_at(&self, at: DateTime<Utc>) -> Result<Resolution, BlockTimeError> {
        self.resolve(at.timestamp()).await
    }

    /// Answer from the index alone, never touching the network.
    pub fn lookup(&self, timestamp: i64) -> LocalLookup {
        self.history.read().local_lookup(timestamp)
    }

    // ------------------------------------------------------------------
    // Index management
    // ------------------------------------------------------------------

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    /// Replace the whole index.
    pub fn set_index(&self, points: impl IntoIterator<Item = ReferencePoint>) {
        self.history.write().replace(points);
    }

    /// Merge points into the index. Returns the number of new entries.
    pub fn update_index(&self, points: impl IntoIterator<Item = ReferencePoint>) -> usize {
        self.history.write().merge(points)
    }

    /// Merge a persisted snapshot read from `reader`.
    pub fn load_snapshot<R: Read>(&self, reader: R) -> Result<usize, SnapshotError> {
        let snapshot = Snapshot::from_reader(reader)?;
        Ok(self.update_index(snapshot.into_points()))
    }

    /// Capture the current index for persistence.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_index(&self.history.read())
    }

    /// Pull the most recent blocks into the index.
    pub async fn sync(&self) -> Result<usize, BlockTimeError> {
        Ok(self.coordinator.sync().await?)
    }

    /// The reference point for `height`, fetching it when unknown.
    pub async fn load_block(&self, height: u64) -> Result<Option<ReferencePoint>, BlockTimeError> {
        Ok(self.coordinator.load_block(height).await?)
    }

    // ------------------------------------------------------------------
    // Formatting
    // ------------------------------------------------------------------

    /// Render `height` with `pattern`, grouping thousands with `","`.
    pub fn format(&self, height: u64, pattern: &str) -> String {
        self.formatter.format_with_separator(height, pattern, DEFAULT_NUMBER_SEPARATOR)
    }

    pub fn format_with_separator(&self, height: u64, pattern: &str, separator: &str) -> String {
        self.formatter.format_with_separator(height, pattern, separator)
    }

    // ------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------

    pub fn is_online(&self) -> bool {
        self.coordinator.is_online()
    }

    /// Stop issuing fetches. The live listener, if any, keeps running.
    pub fn go_offline(&self) {
        self.coordinator.go_offline();
    }

    /// Subscribe to new blocks.
    ///
    /// # Errors
    ///
    /// [`BlockTimeError::Config`] if the engine was built without a feed;
    /// [`BlockTimeError::Feed`] if the subscription fails.
    pub async fn listen(&self) -> Result<(), BlockTimeError> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| BlockTimeError::Config("no block feed configured".into()))?;
        Ok(listener.listen().await?)
    }

    pub async fn stop_listening(&self) {
        if let Some(listener) = &self.listener {
            listener.stop().await;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(LiveUpdateListener::is_listening)
    }

    /// `None` when the engine has no feed.
    pub fn listener_state(&self) -> Option<ListenerState> {
        self.listener.as_ref().map(LiveUpdateListener::state)
    }
}
