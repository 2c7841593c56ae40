//! Shared test helpers: a synthetic chain and a scripted block source.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blocktime_core::error::SourceError;
use blocktime_core::traits::BlockSource;
use blocktime_core::types::ReferencePoint;
use blocktime_core::HistoryIndex;
use blocktime_engine::{BlockTime, EngineConfig};
use parking_lot::Mutex;

/// First block timestamp of every synthetic chain.
pub const CHAIN_START: i64 = 1_600_000_000;

/// A chain with strictly increasing, irregularly spaced timestamps.
///
/// Spacing between consecutive blocks varies between 301 and 899 seconds.
#[derive(Debug, Clone)]
pub struct SyntheticChain {
    timestamps: Vec<i64>,
}

impl SyntheticChain {
    /// Blocks `0..=tip`.
    pub fn new(tip: u64) -> Self {
        let jitter = |h: u64| ((h.wrapping_mul(7_919)) % 300) as i64;
        let timestamps = (0..=tip)
            .map(|h| CHAIN_START + h as i64 * 600 + jitter(h))
            .collect();
        Self { timestamps }
    }

    pub fn tip(&self) -> u64 {
        self.timestamps.len() as u64 - 1
    }

    pub fn timestamp(&self, height: u64) -> i64 {
        self.timestamps[height as usize]
    }

    pub fn point(&self, height: u64) -> ReferencePoint {
        ReferencePoint::new(height, self.timestamp(height))
    }

    /// Height of the block most recently mined at or before `timestamp`.
    pub fn height_at(&self, timestamp: i64) -> Option<u64> {
        let idx = self.timestamps.partition_point(|ts| *ts <= timestamp);
        idx.checked_sub(1).map(|i| i as u64)
    }

    /// An index holding only the given heights.
    pub fn sparse_index(&self, heights: &[u64]) -> HistoryIndex {
        HistoryIndex::from_points(heights.iter().map(|h| self.point(*h)))
    }
}

/// [`BlockSource`] serving a [`SyntheticChain`].
///
/// Counts calls, tracks how many fetches are in flight at once and can be
/// slowed down or switched to failing.
pub struct MockSource {
    chain: SyntheticChain,
    window: u64,
    recent: u64,
    delay: Option<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<u64>>,
}

impl MockSource {
    pub fn new(chain: SyntheticChain) -> Self {
        Self {
            chain,
            window: 15,
            recent: 15,
            delay: None,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_window(mut self, window: u64) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Anchors requested through `blocks_ending_at`, in order.
    pub fn anchors(&self) -> Vec<u64> {
        self.log.lock().clone()
    }

    pub fn chain(&self) -> &SyntheticChain {
        &self.chain
    }

    async fn enter(&self) -> Result<InFlight<'_>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Http("mock source is down".into()));
        }
        Ok(guard)
    }

    fn range(&self, from: u64, to: u64) -> Vec<ReferencePoint> {
        let to = to.min(self.chain.tip());
        (from..=to).map(|h| self.chain.point(h)).collect()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlockSource for MockSource {
    async fn recent_blocks(&self) -> Result<Vec<ReferencePoint>, SourceError> {
        let _guard = self.enter().await?;
        let tip = self.chain.tip();
        Ok(self.range(tip.saturating_sub(self.recent - 1), tip))
    }

    async fn blocks_ending_at(&self, height: u64) -> Result<Vec<ReferencePoint>, SourceError> {
        self.log.lock().push(height);
        let _guard = self.enter().await?;
        Ok(self.range(height.saturating_sub(self.window - 1), height))
    }

    async fn block_hash_at(&self, height: u64) -> Result<String, SourceError> {
        let _guard = self.enter().await?;
        if height > self.chain.tip() {
            return Err(SourceError::Status { status: 404, url: format!("block-height/{height}") });
        }
        Ok(format!("{height:064x}"))
    }

    async fn block_by_hash(&self, hash: &str) -> Result<ReferencePoint, SourceError> {
        let _guard = self.enter().await?;
        let height =
            u64::from_str_radix(hash, 16).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(self.chain.point(height))
    }
}

/// An online engine over `index`, fetching from `source`, without a feed.
pub fn engine_over(index: HistoryIndex, source: &Arc<MockSource>, config: &EngineConfig) -> BlockTime {
    let source: Arc<dyn BlockSource> = source.clone();
    BlockTime::with_index(config, index, Some(source), None)
}
