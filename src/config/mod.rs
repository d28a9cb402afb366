//! Configuration management for the podium engine
//!
//! This module handles loading and validating configuration from
//! environment variables and TOML files. Every timing constant of the
//! engine (probe pacing, fetch TTLs, rotation dwell windows, scorer
//! weights) lives here so deployments can tune them without rebuilding.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheLimits;
use crate::discovery::ProbePacing;
use crate::engine::rotation::RotationSettings;
use crate::loader::LoaderSettings;
use crate::matcher::ScoreWeights;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server and fetch configuration
    pub server: ServerConfig,

    /// Cache configuration
    pub cache: CacheSettings,

    /// Loader configuration
    pub loader: LoaderSettings,

    /// Rotation configuration
    pub rotation: RotationSettings,

    /// Matcher scoring weights
    pub weights: ScoreWeights,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server discovery and fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Comma-separated list of base URLs to probe
    pub base_csv: String,

    /// HTTP request timeout in milliseconds
    pub http_timeout_ms: u64,

    /// Spacing between root probe attempts in milliseconds
    pub probe_spacing_ms: u64,

    /// Backoff after an exhausted probe sweep in milliseconds
    pub probe_backoff_ms: u64,

    /// Minimum interval between resolve/load attempts in milliseconds
    pub attempt_interval_ms: u64,

    /// Cache TTL for the title index in seconds
    pub index_ttl_secs: u64,

    /// Cache TTL for per-title documents in seconds
    pub title_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_csv: String::from("http://darkone83.myddns.me:8080/xbox"),
            http_timeout_ms: 1200,
            probe_spacing_ms: 200,
            probe_backoff_ms: 2000,
            attempt_interval_ms: 100,
            index_ttl_secs: 6 * 60 * 60,
            title_ttl_secs: 2 * 60,
        }
    }
}

impl ServerConfig {
    /// HTTP timeout as Duration
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Index cache TTL as Duration
    #[must_use]
    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_secs)
    }

    /// Per-title cache TTL as Duration
    #[must_use]
    pub fn title_ttl(&self) -> Duration {
        Duration::from_secs(self.title_ttl_secs)
    }

    /// Minimum resolve/load attempt interval as Duration
    #[must_use]
    pub fn attempt_interval(&self) -> Duration {
        Duration::from_millis(self.attempt_interval_ms)
    }

    /// Probe pacing knobs for the root prober
    #[must_use]
    pub fn probe_pacing(&self) -> ProbePacing {
        ProbePacing {
            spacing: Duration::from_millis(self.probe_spacing_ms),
            backoff: Duration::from_millis(self.probe_backoff_ms),
        }
    }
}

/// On-disk cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache directory
    pub dir: PathBuf,

    /// Maximum number of cached files
    pub max_files: usize,

    /// Maximum total cached bytes
    pub max_bytes: u64,

    /// Maximum cache entry age in seconds
    pub max_age_secs: u64,

    /// Clear the cache directory on first use
    pub flush_on_boot: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/cache"),
            max_files: 32,
            max_bytes: 128 * 1024,
            max_age_secs: 6 * 60 * 60,
            flush_on_boot: false,
        }
    }
}

impl CacheSettings {
    /// Limits in the form the cache consumes
    #[must_use]
    pub fn limits(&self) -> CacheLimits {
        CacheLimits {
            max_files: self.max_files,
            max_bytes: self.max_bytes,
            max_age: Duration::from_secs(self.max_age_secs),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("PODIUM_SERVER_BASE") {
            config.server.base_csv = base;
        }
        if let Some(ms) = env_parse("PODIUM_HTTP_TIMEOUT_MS") {
            config.server.http_timeout_ms = ms;
        }
        if let Some(ms) = env_parse("PODIUM_PROBE_SPACING_MS") {
            config.server.probe_spacing_ms = ms;
        }
        if let Some(ms) = env_parse("PODIUM_PROBE_BACKOFF_MS") {
            config.server.probe_backoff_ms = ms;
        }
        if let Ok(dir) = std::env::var("PODIUM_CACHE_DIR") {
            config.cache.dir = dir.into();
        }
        if let Some(n) = env_parse("PODIUM_CACHE_MAX_FILES") {
            config.cache.max_files = n;
        }
        if let Some(n) = env_parse("PODIUM_CACHE_MAX_BYTES") {
            config.cache.max_bytes = n;
        }
        if let Some(n) = env_parse("PODIUM_CACHE_MAX_AGE_SECS") {
            config.cache.max_age_secs = n;
        }
        if let Some(n) = env_parse("PODIUM_MAX_ROWS") {
            config.loader.max_rows = n;
        }
        if let Ok(level) = std::env::var("PODIUM_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("PODIUM_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.http_timeout_ms == 0 {
            anyhow::bail!("http_timeout_ms must be greater than 0");
        }

        if self.cache.max_files == 0 {
            anyhow::bail!("cache max_files must be greater than 0");
        }

        if self.cache.max_bytes == 0 {
            anyhow::bail!("cache max_bytes must be greater than 0");
        }

        if self.weights.accept_threshold <= 0 {
            anyhow::bail!("accept_threshold must be positive");
        }

        if self.rotation.line_height <= 0 || self.rotation.screen_height <= 0 {
            anyhow::bail!("rotation geometry must be positive");
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
