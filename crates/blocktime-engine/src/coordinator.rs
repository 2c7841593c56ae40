//! Single-flight refinement of timestamp queries against a block source.
//!
//! A resolve first asks the [`HistoryIndex`](blocktime_core::HistoryIndex)
//! for a local answer. When the index only brackets the target, the
//! coordinator estimates the height by interpolation, fetches a window of
//! real blocks around the estimate, merges them and asks again. Each round
//! must strictly shrink the bracket, and the number of rounds is capped.
//!
//! Every operation that fetches from the source holds the coordinator's
//! gate for its whole duration, so at most one fetch sequence is in flight
//! per instance. Waiters are admitted in FIFO order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use blocktime_core::error::RefinementError;
use blocktime_core::estimator::estimate_height;
use blocktime_core::traits::BlockSource;
use blocktime_core::types::{Bracket, LocalLookup, ReferencePoint, Resolution};
use blocktime_core::SharedHistory;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::EngineConfig;

/// Height to request a window ending at, so that the window is centred on
/// `estimate` and the anchor block itself lies strictly inside `bracket`.
///
/// Caller guarantees `bracket.high.height >= bracket.low.height + 2`.
pub fn fetch_anchor(estimate: u64, bracket: &Bracket, window: u64) -> u64 {
    let lowest = bracket.low.height.saturating_add(1);
    let highest = bracket.high.height.saturating_sub(1).max(lowest);
    estimate.saturating_add(window / 2).max(lowest).min(highest)
}

/// Serializes fetch sequences and drives the estimate/fetch/re-check loop.
pub struct RefinementCoordinator {
    history: SharedHistory,
    source: Option<Arc<dyn BlockSource>>,
    online: AtomicBool,
    gate: Mutex<()>,
    max_attempts: u32,
    fetch_window: u64,
}

impl RefinementCoordinator {
    /// A coordinator without a source is permanently offline.
    pub fn new(
        history: SharedHistory,
        source: Option<Arc<dyn BlockSource>>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            history,
            online: AtomicBool::new(config.online && source.is_some()),
            source,
            gate: Mutex::new(()),
            max_attempts: config.max_refinement_attempts.max(1),
            fetch_window: config.fetch_window.max(1),
        }
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Stop issuing new fetches. A fetch already awaiting its response
    /// completes and its result is merged.
    pub fn go_offline(&self) {
        if self.online.swap(false, Ordering::SeqCst) {
            info!("refine: switched offline");
        }
    }

    /// The source, if fetching is currently allowed.
    fn active_source(&self) -> Option<&Arc<dyn BlockSource>> {
        if self.is_online() { self.source.as_ref() } else { None }
    }

    /// Resolve `timestamp` to the height of the block most recently mined
    /// at or before it.
    ///
    /// Returns [`Resolution::Unresolved`] when offline without a local
    /// answer, or when the timestamp precedes the genesis block.
    ///
    /// # Errors
    ///
    /// - [`RefinementError::SourceUnavailable`] if a fetch fails
    /// - [`RefinementError::DivergentRefinement`] if a round fails to shrink
    ///   the bracket or the attempt cap is reached
    ///
    /// Refinement assumes block timestamps rise with height. Real chains only
    /// guarantee median-time-past ordering, so a window whose blocks are all
    /// timestamped outside the bracket leaves it unchanged and a valid query
    /// can still end in `DivergentRefinement`.
    pub async fn resolve(&self, timestamp: i64) -> Result<Resolution, RefinementError> {
        let lookup = self.history.read().local_lookup(timestamp);
        match lookup {
            LocalLookup::Resolved(height) => return Ok(Resolution::Resolved(height)),
            LocalLookup::BeforeGenesis => return Ok(Resolution::Unresolved),
            LocalLookup::Empty | LocalLookup::NeedsRefinement(_) => {}
        }
        if self.active_source().is_none() {
            return Ok(Resolution::Unresolved);
        }

        let _turn = self.gate.lock().await;
        self.refine(timestamp).await
    }

    async fn refine(&self, timestamp: i64) -> Result<Resolution, RefinementError> {
        let mut attempts = 0u32;
        let mut last_span: Option<u64> = None;
        let mut seeded = false;

        loop {
            // A preceding sequence or the live feed may have filled the gap.
            let lookup = self.history.read().local_lookup(timestamp);
            let bracket = match lookup {
                LocalLookup::Resolved(height) => {
                    debug!(timestamp, height, attempts, "refine: resolved");
                    return Ok(Resolution::Resolved(height));
                }
                LocalLookup::BeforeGenesis => return Ok(Resolution::Unresolved),
                LocalLookup::Empty => {
                    let Some(source) = self.active_source() else {
                        return Ok(Resolution::Unresolved);
                    };
                    if seeded {
                        return Ok(Resolution::Unresolved);
                    }
                    seeded = true;
                    let points = source.recent_blocks().await?;
                    let added = self.history.write().merge(points);
                    debug!(added, "refine: seeded empty index");
                    continue;
                }
                LocalLookup::NeedsRefinement(bracket) => bracket,
            };

            let Some(source) = self.active_source() else {
                return Ok(Resolution::Unresolved);
            };

            let span = bracket.block_span();
            if last_span.is_some_and(|prev| span >= prev) || attempts >= self.max_attempts {
                return Err(RefinementError::DivergentRefinement { attempts, span });
            }
            last_span = Some(span);
            attempts += 1;

            let frontier = self.history.read().frontier().map(|p| p.height);
            let estimate = estimate_height(timestamp, &bracket, frontier)?;
            let anchor = fetch_anchor(estimate, &bracket, self.fetch_window);
            debug!(timestamp, %bracket, estimate, anchor, attempt = attempts, "refine: fetching");

            let points = source.blocks_ending_at(anchor).await?;
            let added = self.history.write().merge(points);
            debug!(added, "refine: merged window");
        }
    }

    /// Pull the most recent blocks and merge them. Returns the number of
    /// new index entries; 0 when offline.
    pub async fn sync(&self) -> Result<usize, RefinementError> {
        if self.active_source().is_none() {
            return Ok(0);
        }
        let _turn = self.gate.lock().await;
        let Some(source) = self.active_source() else {
            return Ok(0);
        };

        let points = source.recent_blocks().await?;
        let (added, frontier) = {
            let mut history = self.history.write();
            let added = history.merge(points);
            (added, history.frontier())
        };
        info!(added, frontier = ?frontier.map(|p| p.height), "refine: synced recent blocks");
        Ok(added)
    }

    /// The reference point for `height`, fetching it by hash when it is not
    /// indexed. `None` when offline and not indexed.
    pub async fn load_block(&self, height: u64) -> Result<Option<ReferencePoint>, RefinementError> {
        if let Some(point) = self.indexed_point(height) {
            return Ok(Some(point));
        }
        if self.active_source().is_none() {
            return Ok(None);
        }

        let _turn = self.gate.lock().await;
        if let Some(point) = self.indexed_point(height) {
            return Ok(Some(point));
        }
        let Some(source) = self.active_source() else {
            return Ok(None);
        };

        let point = source.block_at(height).await?;
        self.history.write().insert(point);
        debug!(height = point.height, timestamp = point.timestamp, "refine: loaded block");
        Ok(Some(point))
    }

    fn indexed_point(&self, height: u64) -> Option<ReferencePoint> {
        self.history
            .read()
            .timestamp_of(height)
            .map(|timestamp| ReferencePoint::new(height, timestamp))
    }
}
