//! Unified error handling for the podium crate
//!
//! Domain-specific errors (`FetchError`, `DocumentError`, `ResolveError`)
//! are consolidated into a single [`Error`] enum with an [`ErrorCategory`]
//! classification. Nothing in this crate is fatal to the host process: the
//! engine consumes every failure, leaves state unchanged, and retries on
//! its own cadence. Cache failures never surface here at all; they
//! degrade silently to cache misses.

use std::io;
use thiserror::Error;

/// Errors that can occur while fetching a remote resource
#[derive(Error, Debug)]
pub enum FetchError {
    /// No usable network path (connection refused, DNS failure, ...)
    #[error("Network unavailable: {0}")]
    Unavailable(String),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Server answered with a non-success status
    #[error("Server status: {0}")]
    Status(u16),

    /// Other HTTP client error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors that can occur while interpreting a fetched document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Body is not valid JSON
    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Document parsed but declares no scoreboard sections
    #[error("Document has no scoreboards")]
    MissingScoreboards,

    /// Every declared scoreboard came out empty
    #[error("Document produced no usable boards")]
    EmptyBoards,
}

/// Errors that can occur while resolving a query against the index
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The query normalized to nothing
    #[error("Query is empty after normalization")]
    EmptyQuery,

    /// No index entry reached the acceptance threshold
    #[error("No acceptable match for query")]
    NoAcceptableMatch,
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (unreachable, timeout, bad status)
    Network,
    /// Parsing and document-shape errors
    Parsing,
    /// Matching and resolution errors
    Resolve,
    /// Storage and I/O errors
    Storage,
    /// Configuration errors
    Config,
}

/// Unified error type for the podium crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Document interpretation errors
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Resolution errors
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is recoverable by simply retrying on the next
    /// eligible tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            Self::Document(_) => true,
            Self::Resolve(_) => true,
            Self::Io(_) => true,
            Self::Config(_) => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Document(_) => ErrorCategory::Parsing,
            Self::Resolve(_) => ErrorCategory::Resolve,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
