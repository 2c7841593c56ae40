//! # blocktime-source
//! Block metadata transports.
//!
//! Concrete collaborators for the estimation engine:
//! - [`client::MempoolClient`]: HTTP block metadata client ([`BlockSource`])
//! - [`feed::MempoolFeed`]: WebSocket new-block subscription ([`BlockFeed`])
//! - [`feed::ChannelFeed`]: in-process feed for embedding and tests
//! - [`protocol`]: wire types, control frames and frame decoding
//!
//! [`BlockSource`]: blocktime_core::traits::BlockSource
//! [`BlockFeed`]: blocktime_core::traits::BlockFeed

pub mod client;
pub mod config;
pub mod feed;
pub mod protocol;

pub use client::MempoolClient;
pub use config::SourceConfig;
pub use feed::{ChannelFeed, MempoolFeed};
pub use protocol::{decode_frame, subscribe_frames, WireBlock, NEW_BLOCKS_TOPIC};
