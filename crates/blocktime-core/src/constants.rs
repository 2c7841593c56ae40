//! Chain constants used by the estimator and the formatter.

/// Number of blocks in one halving epoch.
pub const BLOCKS_PER_HALVING: u64 = 210_000;

/// Height of the genesis block.
pub const GENESIS_HEIGHT: u64 = 0;

/// Unix timestamp of the Bitcoin genesis block (2009-01-03 18:15:05 UTC).
pub const GENESIS_TIMESTAMP: i64 = 1_231_006_505;

/// Default number of blocks returned by one "blocks around height" query.
pub const DEFAULT_FETCH_WINDOW: u64 = 15;

/// Default cap on refinement rounds for a single resolve request.
pub const DEFAULT_MAX_REFINEMENT_ATTEMPTS: u32 = 32;

/// Default thousands separator used by the formatter.
pub const DEFAULT_NUMBER_SEPARATOR: &str = ",";

/// Seconds in one minute.
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Milliseconds in one second.
pub const MILLIS_PER_SECOND: i64 = 1_000;
