//! Core value types: reference points, brackets and resolution outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One block mined at a known time.
///
/// Heights are assumed to increase with timestamps. Timestamps are Unix
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Block height.
    pub height: u64,
    /// Block timestamp in Unix seconds.
    pub timestamp: i64,
}

impl ReferencePoint {
    pub const fn new(height: u64, timestamp: i64) -> Self {
        Self { height, timestamp }
    }
}

impl fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.height, self.timestamp)
    }
}

/// Two reference points surrounding an unindexed target.
///
/// Used both as the interpolation basis for the estimator and as the
/// anchor range for network queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub low: ReferencePoint,
    pub high: ReferencePoint,
}

impl Bracket {
    pub const fn new(low: ReferencePoint, high: ReferencePoint) -> Self {
        Self { low, high }
    }

    /// Number of blocks between the two ends, or 0 if the bracket is inverted.
    pub fn block_span(&self) -> u64 {
        self.high.height.saturating_sub(self.low.height)
    }

    /// Seconds between the two ends (may be negative for inverted input).
    /// Widened so any pair of `i64` timestamps fits.
    pub fn time_span(&self) -> i128 {
        i128::from(self.high.timestamp) - i128::from(self.low.timestamp)
    }

    /// Whether `timestamp` falls in `[low.timestamp, high.timestamp)`.
    pub fn contains_timestamp(&self, timestamp: i64) -> bool {
        self.low.timestamp <= timestamp && timestamp < self.high.timestamp
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.low, self.high)
    }
}

/// Outcome of resolving a timestamp to a block height.
///
/// Transport failures are reported separately as errors, so callers can
/// always tell "no answer available" apart from "the source failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Height of the block most recently mined at or before the timestamp.
    Resolved(u64),
    /// No local answer and no refinement allowed (offline), or the
    /// timestamp precedes the genesis block.
    Unresolved,
}

impl Resolution {
    pub fn height(&self) -> Option<u64> {
        match self {
            Self::Resolved(height) => Some(*height),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Answer the index can give for a timestamp without any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalLookup {
    /// The index alone pins down the height.
    Resolved(u64),
    /// The target lies inside this bracket and more data is needed.
    NeedsRefinement(Bracket),
    /// The timestamp precedes the genesis block.
    BeforeGenesis,
    /// The index holds no entries.
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_spans() {
        let b = Bracket::new(ReferencePoint::new(100, 1_000), ReferencePoint::new(110, 7_000));
        assert_eq!(b.block_span(), 10);
        assert_eq!(b.time_span(), 6_000);

        let extreme = Bracket::new(ReferencePoint::new(0, i64::MIN), ReferencePoint::new(1, i64::MAX));
        assert_eq!(extreme.time_span(), i128::from(u64::MAX));
    }

    #[test]
    fn inverted_bracket_has_zero_block_span() {
        let b = Bracket::new(ReferencePoint::new(110, 1_000), ReferencePoint::new(100, 7_000));
        assert_eq!(b.block_span(), 0);
    }

    #[test]
    fn bracket_contains_is_half_open() {
        let b = Bracket::new(ReferencePoint::new(1, 10), ReferencePoint::new(5, 50));
        assert!(b.contains_timestamp(10));
        assert!(b.contains_timestamp(49));
        assert!(!b.contains_timestamp(50));
        assert!(!b.contains_timestamp(9));
    }

    #[test]
    fn resolution_accessors() {
        assert_eq!(Resolution::Resolved(7).height(), Some(7));
        assert_eq!(Resolution::Unresolved.height(), None);
        assert!(Resolution::Resolved(0).is_resolved());
        assert!(!Resolution::Unresolved.is_resolved());
    }

    #[test]
    fn reference_point_display() {
        assert_eq!(ReferencePoint::new(807_507, 1_694_632_075).to_string(), "#807507@1694632075");
    }

    #[test]
    fn reference_point_serde_shape() {
        let json = serde_json::to_string(&ReferencePoint::new(3, 42)).unwrap();
        assert_eq!(json, r#"{"height":3,"timestamp":42}"#);
    }
}
