//! # blocktime-core
//! Foundation types for mapping timestamps to block heights.
//!
//! - [`history::HistoryIndex`]: sparse timestamp ↔ height index with sorted views
//! - [`estimator`]: linear interpolation between two reference points
//! - [`format`]: halving-aware block height formatting
//! - [`traits`]: contracts for the block metadata source and the new-block feed

pub mod baseline;
pub mod constants;
pub mod error;
pub mod estimator;
pub mod format;
pub mod history;
pub mod snapshot;
pub mod traits;
pub mod types;

pub use error::BlockTimeError;
pub use history::{HistoryIndex, SharedHistory};
pub use types::{Bracket, LocalLookup, ReferencePoint, Resolution};
