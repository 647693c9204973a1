//! Error types for soundcheck
//!
//! One crate-wide enum; per-item analysis failures are caught at the
//! orchestrator boundary and never abort a batch, import-time failures
//! prevent item creation entirely.

use thiserror::Error;

/// Common result type for soundcheck operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Sample rate / sampling density combination yields an empty block
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(String),

    /// Input shorter than one analysis block
    #[error("Insufficient samples: {0}")]
    InsufficientSamples(String),

    /// Unsupported codec or corrupt container
    #[error("Decode error: {0}")]
    Decode(String),

    /// Duration metadata probe failed (non-fatal, item is kept)
    #[error("Duration probe failed: {0}")]
    Probe(String),

    /// Source rejected by the supported-media predicate
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// Source matches an already-imported item's dedup key
    #[error("Duplicate item: {0}")]
    Duplicate(String),

    /// URL failed validation before any request was made
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Remote server answered with a non-success status
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// HTTP transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Another analysis (batch or single-item) is already running
    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    /// Requested item is not in the registry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (task join failures and the like)
    #[error("Internal error: {0}")]
    Internal(String),
}
