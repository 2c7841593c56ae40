//! Sparse timestamp ↔ height index.
//!
//! [`HistoryIndex`] owns the primary `timestamp → height` mapping and three
//! derived views: ascending timestamps, ascending heights, and the inverse
//! `height → timestamp` mapping. Every mutation rebuilds the derived views
//! before returning, so a reader holding `&HistoryIndex` never observes a
//! view that disagrees with the primary mapping.
//!
//! All searches are index-based binary searches over the immutable sorted
//! views (`partition_point`), O(log n) per call.
//!
//! Not thread-safe on its own; share it as a [`SharedHistory`] so that
//! writers take the lock for the whole upsert + rebuild.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::constants::{GENESIS_HEIGHT, GENESIS_TIMESTAMP};
use crate::types::{Bracket, LocalLookup, ReferencePoint};

/// The index shared between the refinement coordinator and the live listener.
pub type SharedHistory = Arc<RwLock<HistoryIndex>>;

/// Timestamp ↔ height index with always-consistent sorted views.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    /// Primary mapping: timestamp → height. Last write wins on collision.
    by_timestamp: HashMap<i64, u64>,
    /// Derived: every indexed timestamp, ascending.
    timestamps: Vec<i64>,
    /// Derived: every indexed height, ascending and deduplicated.
    heights: Vec<u64>,
    /// Derived: height → timestamp. The latest timestamp wins when one
    /// height appears under several timestamps.
    by_height: HashMap<u64, i64>,
}

impl HistoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from reference points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = ReferencePoint>,
    {
        let mut index = Self::new();
        index.merge(points);
        index
    }

    /// Wrap this index for sharing across tasks.
    pub fn into_shared(self) -> SharedHistory {
        Arc::new(RwLock::new(self))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Upsert every point, then rebuild the derived views once.
    ///
    /// Returns the number of timestamps that were not indexed before.
    /// Merging the same points twice leaves the index unchanged.
    pub fn merge<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = ReferencePoint>,
    {
        let mut added = 0;
        for point in points {
            if self.by_timestamp.insert(point.timestamp, point.height).is_none() {
                added += 1;
            }
        }
        self.rebuild();
        added
    }

    /// Upsert a single point.
    pub fn insert(&mut self, point: ReferencePoint) -> bool {
        self.merge(std::iter::once(point)) == 1
    }

    /// Discard all entries and rebuild from `points`.
    pub fn replace<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = ReferencePoint>,
    {
        self.by_timestamp.clear();
        self.merge(points);
    }

    fn rebuild(&mut self) {
        let mut timestamps: Vec<i64> = self.by_timestamp.keys().copied().collect();
        timestamps.sort_unstable();

        let mut by_height = HashMap::with_capacity(timestamps.len());
        for ts in &timestamps {
            by_height.insert(self.by_timestamp[ts], *ts);
        }

        let mut heights: Vec<u64> = by_height.keys().copied().collect();
        heights.sort_unstable();

        self.timestamps = timestamps;
        self.heights = heights;
        self.by_height = by_height;
    }

    // ------------------------------------------------------------------
    // Point queries
    // ------------------------------------------------------------------

    /// Number of indexed timestamps.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Height stored for exactly `timestamp`. O(1).
    pub fn lookup_exact(&self, timestamp: i64) -> Option<u64> {
        self.by_timestamp.get(&timestamp).copied()
    }

    /// Timestamp stored for `height` (reverse lookup).
    pub fn timestamp_of(&self, height: u64) -> Option<i64> {
        self.by_height.get(&height).copied()
    }

    pub fn contains_height(&self, height: u64) -> bool {
        self.by_height.contains_key(&height)
    }

    /// Highest-height reference point.
    pub fn frontier(&self) -> Option<ReferencePoint> {
        let height = *self.heights.last()?;
        Some(ReferencePoint::new(height, self.by_height[&height]))
    }

    /// Lowest-height reference point.
    pub fn origin(&self) -> Option<ReferencePoint> {
        let height = *self.heights.first()?;
        Some(ReferencePoint::new(height, self.by_height[&height]))
    }

    /// Ascending timestamp view.
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Ascending height view.
    pub fn heights(&self) -> &[u64] {
        &self.heights
    }

    /// Every entry as a reference point, in ascending timestamp order.
    pub fn points(&self) -> impl Iterator<Item = ReferencePoint> + '_ {
        self.timestamps
            .iter()
            .map(|ts| ReferencePoint::new(self.by_timestamp[ts], *ts))
    }

    /// The persisted `{ "<timestamp>": height }` form, keys in ascending order.
    pub fn to_snapshot_map(&self) -> BTreeMap<String, u64> {
        self.points()
            .map(|p| (p.timestamp.to_string(), p.height))
            .collect()
    }

    // ------------------------------------------------------------------
    // Searches
    // ------------------------------------------------------------------

    /// Indexed entry with the greatest timestamp `<= timestamp`.
    pub fn predecessor(&self, timestamp: i64) -> Option<ReferencePoint> {
        let idx = self.timestamps.partition_point(|ts| *ts <= timestamp);
        let ts = *self.timestamps.get(idx.checked_sub(1)?)?;
        Some(ReferencePoint::new(self.by_timestamp[&ts], ts))
    }

    /// Indexed entry with the smallest timestamp `> timestamp`.
    pub fn successor(&self, timestamp: i64) -> Option<ReferencePoint> {
        let idx = self.timestamps.partition_point(|ts| *ts <= timestamp);
        let ts = *self.timestamps.get(idx)?;
        Some(ReferencePoint::new(self.by_timestamp[&ts], ts))
    }

    /// Indexed timestamp nearest to `timestamp` under the predecessor rule.
    ///
    /// Returns the greatest indexed timestamp `<= timestamp`. When the query
    /// precedes every entry, returns the first indexed timestamp. The result
    /// is always one of the two entries adjacent to the query on the number
    /// line. `None` only for an empty index.
    pub fn nearest_indexed_timestamp(&self, timestamp: i64) -> Option<i64> {
        self.predecessor(timestamp)
            .map(|p| p.timestamp)
            .or_else(|| self.timestamps.first().copied())
    }

    /// Tightest known heights strictly surrounding `height`.
    ///
    /// Inside the known range this returns `(lo, hi)` with `lo < height < hi`
    /// when such entries exist. At or beyond either edge it degrades to the
    /// two boundary-most heights on that side. With a single entry both ends
    /// are that entry. `None` for an empty index.
    pub fn neighbors_around_height(&self, height: u64) -> Option<(u64, u64)> {
        let heights = &self.heights;
        let last = heights.len().checked_sub(1)?;

        let below = heights.partition_point(|h| *h < height);
        let above = heights.partition_point(|h| *h <= height);

        if below == 0 {
            return Some((heights[0], heights[last.min(1)]));
        }
        if above > last {
            return Some((heights[last.saturating_sub(1)], heights[last]));
        }
        Some((heights[below - 1], heights[above]))
    }

    /// Answer a timestamp query from the index alone.
    ///
    /// Resolution rules, in order:
    /// 1. an exact timestamp hit returns its height;
    /// 2. a timestamp at or after the frontier returns the frontier height;
    /// 3. with predecessor `p` and successor `s`, the target resolves to
    ///    `p.height` once `s.height <= p.height + 1`;
    /// 4. otherwise the caller gets the `(p, s)` bracket to refine.
    ///
    /// Before the first entry, an index whose origin is the genesis block
    /// reports [`LocalLookup::BeforeGenesis`]; otherwise the bracket runs
    /// from the genesis block to the origin.
    pub fn local_lookup(&self, timestamp: i64) -> LocalLookup {
        let Some(frontier) = self.frontier() else {
            return LocalLookup::Empty;
        };

        if let Some(height) = self.lookup_exact(timestamp) {
            return LocalLookup::Resolved(height);
        }
        if timestamp >= frontier.timestamp {
            return LocalLookup::Resolved(frontier.height);
        }

        let Some(low) = self.predecessor(timestamp) else {
            return self.lookup_before_origin(timestamp);
        };
        let Some(high) = self.successor(timestamp) else {
            return LocalLookup::Resolved(low.height);
        };

        if high.height <= low.height + 1 {
            LocalLookup::Resolved(low.height)
        } else {
            LocalLookup::NeedsRefinement(Bracket::new(low, high))
        }
    }

    fn lookup_before_origin(&self, timestamp: i64) -> LocalLookup {
        let Some(origin) = self.origin() else {
            return LocalLookup::Empty;
        };
        if origin.height == GENESIS_HEIGHT || timestamp < GENESIS_TIMESTAMP {
            return LocalLookup::BeforeGenesis;
        }
        if origin.height == GENESIS_HEIGHT + 1 {
            return LocalLookup::Resolved(GENESIS_HEIGHT);
        }
        let genesis = ReferencePoint::new(GENESIS_HEIGHT, GENESIS_TIMESTAMP);
        LocalLookup::NeedsRefinement(Bracket::new(genesis, origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn p(height: u64, timestamp: i64) -> ReferencePoint {
        ReferencePoint::new(height, timestamp)
    }

    /// Heights 100..=110 at 600 s spacing starting at t = 60_000, with
    /// heights 104..=106 missing.
    fn sparse_index() -> HistoryIndex {
        HistoryIndex::from_points(
            (100u64..=110)
                .filter(|h| !(104..=106).contains(h))
                .map(|h| p(h, 60_000 + (h as i64 - 100) * 600)),
        )
    }

    // ------------------------------------------------------------------
    // Mutation and views
    // ------------------------------------------------------------------

    #[test]
    fn empty_index() {
        let index = HistoryIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.frontier(), None);
        assert_eq!(index.origin(), None);
        assert_eq!(index.nearest_indexed_timestamp(5), None);
        assert_eq!(index.neighbors_around_height(5), None);
        assert_eq!(index.local_lookup(5), LocalLookup::Empty);
    }

    #[test]
    fn merge_rebuilds_sorted_views() {
        let mut index = HistoryIndex::new();
        index.merge([p(3, 30), p(1, 10), p(2, 20)]);
        assert_eq!(index.timestamps(), &[10, 20, 30]);
        assert_eq!(index.heights(), &[1, 2, 3]);
        assert_eq!(index.timestamp_of(2), Some(20));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut index = HistoryIndex::new();
        assert_eq!(index.merge([p(1, 10), p(2, 20)]), 2);
        let before: Vec<_> = index.points().collect();
        assert_eq!(index.merge([p(1, 10), p(2, 20)]), 0);
        let after: Vec<_> = index.points().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn timestamp_collision_last_write_wins() {
        let mut index = HistoryIndex::from_points([p(1, 10)]);
        index.insert(p(7, 10));
        assert_eq!(index.lookup_exact(10), Some(7));
        assert_eq!(index.heights(), &[7]);
        assert!(!index.contains_height(1));
    }

    #[test]
    fn duplicate_height_keeps_latest_timestamp_in_inverse_view() {
        let index = HistoryIndex::from_points([p(5, 10), p(5, 12)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.heights(), &[5]);
        assert_eq!(index.timestamp_of(5), Some(12));
    }

    #[test]
    fn replace_discards_previous_entries() {
        let mut index = sparse_index();
        index.replace([p(1, 10), p(2, 20)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.frontier(), Some(p(2, 20)));
        assert_eq!(index.origin(), Some(p(1, 10)));
        assert_eq!(index.lookup_exact(60_000), None);
    }

    #[test]
    fn frontier_and_origin_follow_heights() {
        let index = sparse_index();
        assert_eq!(index.frontier(), Some(p(110, 66_000)));
        assert_eq!(index.origin(), Some(p(100, 60_000)));
    }

    #[test]
    fn snapshot_map_uses_decimal_keys() {
        let index = HistoryIndex::from_points([p(2, 20), p(1, 10)]);
        let map = index.to_snapshot_map();
        assert_eq!(map.get("10"), Some(&1));
        assert_eq!(map.get("20"), Some(&2));
    }

    // ------------------------------------------------------------------
    // Searches
    // ------------------------------------------------------------------

    #[test]
    fn nearest_timestamp_uses_predecessor() {
        let index = HistoryIndex::from_points([p(1, 10), p(2, 20), p(3, 30)]);
        assert_eq!(index.nearest_indexed_timestamp(20), Some(20));
        assert_eq!(index.nearest_indexed_timestamp(21), Some(20));
        assert_eq!(index.nearest_indexed_timestamp(29), Some(20));
        assert_eq!(index.nearest_indexed_timestamp(99), Some(30));
    }

    #[test]
    fn nearest_timestamp_before_first_entry_returns_first() {
        let index = HistoryIndex::from_points([p(1, 10), p(2, 20)]);
        assert_eq!(index.nearest_indexed_timestamp(3), Some(10));
    }

    #[test]
    fn predecessor_and_successor() {
        let index = HistoryIndex::from_points([p(1, 10), p(2, 20)]);
        assert_eq!(index.predecessor(15), Some(p(1, 10)));
        assert_eq!(index.successor(15), Some(p(2, 20)));
        assert_eq!(index.predecessor(9), None);
        assert_eq!(index.successor(20), None);
    }

    #[test]
    fn neighbors_inside_range() {
        let index = sparse_index();
        assert_eq!(index.neighbors_around_height(105), Some((103, 107)));
        assert_eq!(index.neighbors_around_height(102), Some((101, 103)));
    }

    #[test]
    fn neighbors_at_edges_degrade_to_boundary_pair() {
        let index = sparse_index();
        assert_eq!(index.neighbors_around_height(100), Some((100, 101)));
        assert_eq!(index.neighbors_around_height(3), Some((100, 101)));
        assert_eq!(index.neighbors_around_height(110), Some((109, 110)));
        assert_eq!(index.neighbors_around_height(999), Some((109, 110)));
    }

    #[test]
    fn neighbors_single_entry() {
        let index = HistoryIndex::from_points([p(42, 1)]);
        assert_eq!(index.neighbors_around_height(42), Some((42, 42)));
        assert_eq!(index.neighbors_around_height(7), Some((42, 42)));
    }

    // ------------------------------------------------------------------
    // Local lookup
    // ------------------------------------------------------------------

    #[test]
    fn lookup_exact_hit() {
        let index = sparse_index();
        assert_eq!(index.local_lookup(60_600), LocalLookup::Resolved(101));
    }

    #[test]
    fn lookup_between_adjacent_heights_resolves_to_predecessor() {
        let index = sparse_index();
        assert_eq!(index.local_lookup(60_601), LocalLookup::Resolved(101));
        assert_eq!(index.local_lookup(61_199), LocalLookup::Resolved(101));
    }

    #[test]
    fn lookup_at_or_after_frontier_returns_frontier() {
        let index = sparse_index();
        assert_eq!(index.local_lookup(66_000), LocalLookup::Resolved(110));
        assert_eq!(index.local_lookup(10_000_000), LocalLookup::Resolved(110));
    }

    #[test]
    fn lookup_inside_gap_needs_refinement() {
        let index = sparse_index();
        let expected = Bracket::new(p(103, 61_800), p(107, 64_200));
        assert_eq!(index.local_lookup(62_500), LocalLookup::NeedsRefinement(expected));
    }

    #[test]
    fn lookup_before_genesis_origin() {
        let index = HistoryIndex::from_points([p(0, GENESIS_TIMESTAMP), p(1, GENESIS_TIMESTAMP + 600)]);
        assert_eq!(index.local_lookup(GENESIS_TIMESTAMP - 1), LocalLookup::BeforeGenesis);
    }

    #[test]
    fn lookup_before_non_genesis_origin_brackets_from_genesis() {
        let origin = p(500, GENESIS_TIMESTAMP + 300_000);
        let index = HistoryIndex::from_points([origin, p(501, GENESIS_TIMESTAMP + 300_600)]);
        let genesis = p(GENESIS_HEIGHT, GENESIS_TIMESTAMP);
        assert_eq!(
            index.local_lookup(GENESIS_TIMESTAMP + 1_000),
            LocalLookup::NeedsRefinement(Bracket::new(genesis, origin))
        );
    }

    #[test]
    fn lookup_before_height_one_origin_is_genesis() {
        let index = HistoryIndex::from_points([p(1, GENESIS_TIMESTAMP + 600)]);
        assert_eq!(index.local_lookup(GENESIS_TIMESTAMP + 10), LocalLookup::Resolved(0));
    }

    #[test]
    fn lookup_out_of_order_timestamps_resolves_to_predecessor() {
        // Block 11 carries an earlier timestamp than block 10.
        let index = HistoryIndex::from_points([p(9, 100), p(11, 150), p(10, 160), p(20, 900)]);
        assert_eq!(index.local_lookup(155), LocalLookup::Resolved(11));
    }
}
