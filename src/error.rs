//! Error handling for station spread operations.
//!
//! Provides error types with context for invalid aggregation input,
//! resource limits, cancellation, and file loading failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input for region {region}: {reason}")]
    InvalidInput { region: String, reason: String },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(
        "Distance accumulator for region {region} would hold {estimated_pairs} pairs, exceeding the limit of {limit}"
    )]
    MemoryLimitExceeded {
        region: String,
        estimated_pairs: u64,
        limit: u64,
    },

    #[error("Processing cancelled for region {region} before year {year}")]
    Cancelled { region: String, year: i32 },

    #[error("Region task failed to complete: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl SpreadError {
    /// Create an invalid input error for a region
    pub fn invalid_input(region: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            region: region.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the error came from a cancellation request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, SpreadError>;
