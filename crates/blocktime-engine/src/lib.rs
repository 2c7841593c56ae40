//! # blocktime-engine
//! Async orchestration over the blocktime core.
//!
//! - [`coordinator::RefinementCoordinator`]: single-flight estimate/fetch/re-check loop
//! - [`listener::LiveUpdateListener`]: merges newly announced blocks as they arrive
//! - [`engine::BlockTime`]: the facade applications construct and hold
//! - [`logging::init_logging`]: tracing subscriber setup for applications
//!
//! ```no_run
//! use blocktime_engine::{BlockTime, EngineConfig};
//!
//! # async fn run() -> Result<(), blocktime_core::BlockTimeError> {
//! let config = EngineConfig::from_env()?;
//! blocktime_engine::init_logging(&config.log_level, &config.log_format);
//!
//! let engine = BlockTime::with_mempool(&config)?;
//! engine.start().await?;
//! if let Some(height) = engine.resolve(1_700_000_000).await?.height() {
//!     println!("{}", engine.format(height, "B [in halving] h"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod listener;
pub mod logging;

pub use config::EngineConfig;
pub use coordinator::RefinementCoordinator;
pub use engine::BlockTime;
pub use listener::{ListenerState, LiveUpdateListener};
pub use logging::init_logging;
