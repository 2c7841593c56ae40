//! Error types for blocktime.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
    #[error("invalid bracket: low {low}, high {high}")] InvalidBracket { low: String, high: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("http: {0}")] Http(String),
    #[error("unexpected status {status} from {url}")] Status { status: u16, url: String },
    #[error("decode: {0}")] Decode(String),
    #[error("empty response from {0}")] EmptyResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("connect: {0}")] Connect(String),
    #[error("send: {0}")] Send(String),
    #[error("decode: {0}")] Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("json: {0}")] Json(String),
    #[error("invalid timestamp key: {0}")] InvalidTimestamp(String),
    #[error("io: {0}")] Io(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefinementError {
    #[error("source unavailable: {0}")] SourceUnavailable(#[from] SourceError),
    #[error("refinement diverged after {attempts} attempts (bracket span {span})")] DivergentRefinement { attempts: u32, span: u64 },
    #[error(transparent)] Estimate(#[from] EstimateError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockTimeError {
    #[error(transparent)] Estimate(#[from] EstimateError),
    #[error(transparent)] Source(#[from] SourceError),
    #[error(transparent)] Feed(#[from] FeedError),
    #[error(transparent)] Snapshot(#[from] SnapshotError),
    #[error(transparent)] Refinement(#[from] RefinementError),
    #[error("config: {0}")] Config(String),
}
