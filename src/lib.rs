//! podium - Leaderboard resolver engine
//!
//! Resolves a free-text application name reported by a remote device into
//! a leaderboard dataset fetched from a best-effort set of candidate
//! servers, kept responsive through a bounded on-disk cache.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and tuning constants
//! - [`normalize`] - Query/title normalization into tokens and keys
//! - [`matcher`] - Fuzzy candidate scoring and family grouping
//! - [`discovery`] - Incremental probing of candidate server roots
//! - [`cache`] - Size/age-bounded file cache for fetched resources
//! - [`fetch`] - Timeout-bounded HTTP fetching through the cache
//! - [`loader`] - Per-title document parsing into board models
//! - [`engine`] - The session state machine driving it all from `tick()`
//!
//! # Example
//!
//! ```no_run
//! use podium::config::Config;
//! use podium::engine::Engine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let mut engine = Engine::new(config)?;
//!     engine.on_app_name("Halo 2");
//!     loop {
//!         engine.tick().await;
//!         if engine.is_active() {
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(40)).await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod matcher;
pub mod models;
pub mod normalize;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::engine::{Engine, EngineState};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Board, Model, Row};
}

// Direct re-exports for convenience
pub use engine::{Engine, EngineState};
pub use models::{Board, Model, Row};
