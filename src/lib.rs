//! Station Spread Library
//!
//! A Rust library for measuring how geographically spread out a region's
//! electric-vehicle charging network is, year by year.
//!
//! This library provides tools for:
//! - Loading and cleaning charging-station snapshot CSVs
//! - Incremental per-year pairwise great-circle distance statistics
//! - Concurrent per-region processing with cooperative cancellation
//! - Writing results as CSV, Parquet or JSON
//! - Year-over-year changes and correlation with registration counts

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod distance;
pub mod error;
pub mod loader;
pub mod models;
pub mod processor;
pub mod report;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use aggregator::{StationYearDistanceAggregator, aggregate};
pub use config::{AccumulatorMode, LoaderConfig, SpreadConfig};
pub use distance::great_circle_miles;
pub use error::{Result, SpreadError};
pub use loader::{LoadedStations, StationLoader};
pub use models::{RegionReport, Station, YearlyStat};
pub use processor::{OutputFormat, ProcessingOutcome, RegionProcessor, ResultWriter};
