//! Configuration management and validation.
//!
//! Provides configuration structures for the aggregation run, the station
//! loader's column mapping and filters, and system profiling used to pick
//! sensible defaults for worker count and retained-distance limits.

use crate::constants::{
    BYTES_PER_DISTANCE, DEFAULT_MAX_RETAINED_PAIRS, DEFAULT_OVERRIDE_TOLERANCE_DEGREES,
    MAX_WORKERS, RETAIN_MEMORY_FRACTION, columns,
};
use crate::error::{Result, SpreadError};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How the pairwise distance accumulator stores what it has seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccumulatorMode {
    /// Running count, sum and maximum only - constant memory per region
    #[default]
    Streaming,
    /// Keep every distance keyed by year, refusing regions above `max_pairs`
    Retain { max_pairs: Option<u64> },
}

/// System profiling information for sizing defaults
#[derive(Debug, Clone)]
pub struct SystemProfile {
    /// Number of CPU cores available
    pub cpu_cores: usize,
    /// Total memory in MB (0 when unknown)
    pub memory_mb: usize,
}

impl SystemProfile {
    /// Auto-detect system capabilities
    pub fn detect() -> Self {
        use sysinfo::System;

        let cpu_cores = num_cpus::get();

        let mut system = System::new();
        system.refresh_memory();
        let memory_mb = (system.total_memory() / 1024 / 1024) as usize;

        Self {
            cpu_cores,
            memory_mb,
        }
    }

    /// Retained-distance cap that fits in a fraction of system memory
    pub fn default_max_retained_pairs(&self) -> u64 {
        if self.memory_mb == 0 {
            return DEFAULT_MAX_RETAINED_PAIRS;
        }

        let budget_bytes = (self.memory_mb as u64 * 1024 * 1024) / RETAIN_MEMORY_FRACTION;
        let pairs = budget_bytes / BYTES_PER_DISTANCE;

        debug!(
            "Retain cap: {} pairs ({}MB memory, 1/{} budget)",
            pairs, self.memory_mb, RETAIN_MEMORY_FRACTION
        );
        pairs
    }
}

/// Names of the input CSV columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Station identifier column; row numbers are used when absent
    pub id: Option<String>,
    pub region: String,
    pub latitude: String,
    pub longitude: String,
    pub open_date: String,
    /// Planned opening date column; stations expected after the reference date are dropped
    pub expected_date: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: Some(columns::ID.to_string()),
            region: columns::REGION.to_string(),
            latitude: columns::LATITUDE.to_string(),
            longitude: columns::LONGITUDE.to_string(),
            open_date: columns::OPEN_DATE.to_string(),
            expected_date: Some(columns::EXPECTED_DATE.to_string()),
        }
    }
}

/// A manual correction moving one misfiled station to another region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOverride {
    /// Region the station should be counted in
    pub to_region: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Only match stations opened in this year
    #[serde(default)]
    pub open_year: Option<i32>,
    /// Only match stations currently filed under this region
    #[serde(default)]
    pub from_region: Option<String>,
    #[serde(default = "default_override_tolerance")]
    pub tolerance_degrees: f64,
}

fn default_override_tolerance() -> f64 {
    DEFAULT_OVERRIDE_TOLERANCE_DEGREES
}

impl RegionOverride {
    pub fn new(to_region: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            to_region: to_region.into(),
            latitude,
            longitude,
            open_year: None,
            from_region: None,
            tolerance_degrees: DEFAULT_OVERRIDE_TOLERANCE_DEGREES,
        }
    }

    pub fn with_open_year(mut self, open_year: i32) -> Self {
        self.open_year = Some(open_year);
        self
    }

    pub fn with_from_region(mut self, from_region: impl Into<String>) -> Self {
        self.from_region = Some(from_region.into());
        self
    }
}

/// Station loader configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub columns: ColumnMapping,

    /// Date that separates open stations from planned ones (default: today)
    pub reference_date: Option<NaiveDate>,

    /// Keep only these regions (all regions when empty)
    pub regions: Vec<String>,

    /// Manual region corrections applied after filtering
    pub overrides: Vec<RegionOverride>,
}

impl LoaderConfig {
    /// Reference date, falling back to the local current date
    pub fn effective_reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Global configuration for a station spread run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    /// Number of regions aggregated concurrently
    pub workers: usize,

    /// Distance accumulator storage mode
    pub accumulator: AccumulatorMode,

    /// First year reported for every region (default: each region's earliest open year)
    pub first_year: Option<i32>,

    /// Last year reported (default: the loader's reference year)
    pub as_of_year: Option<i32>,

    pub loader: LoaderConfig,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            workers: SystemProfile::detect().cpu_cores.max(1),
            accumulator: AccumulatorMode::Streaming,
            first_year: None,
            as_of_year: None,
            loader: LoaderConfig::default(),
        }
    }
}

impl SpreadConfig {
    /// Load configuration from a JSON file, with defaults for missing fields
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SpreadError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: SpreadConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the accumulator storage mode
    pub fn with_accumulator(mut self, accumulator: AccumulatorMode) -> Self {
        self.accumulator = accumulator;
        self
    }

    /// Retain raw distances, capped by detected system memory
    pub fn with_retained_distances(mut self, max_pairs: Option<u64>) -> Self {
        let max_pairs =
            max_pairs.or_else(|| Some(SystemProfile::detect().default_max_retained_pairs()));
        self.accumulator = AccumulatorMode::Retain { max_pairs };
        self
    }

    pub fn with_first_year(mut self, year: i32) -> Self {
        self.first_year = Some(year);
        self
    }

    pub fn with_as_of_year(mut self, year: i32) -> Self {
        self.as_of_year = Some(year);
        self
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// Last year of every region's range
    pub fn effective_as_of_year(&self) -> i32 {
        self.as_of_year
            .unwrap_or_else(|| self.loader.effective_reference_date().year())
    }

    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SpreadError::configuration("workers must be at least 1"));
        }

        if self.workers > MAX_WORKERS {
            return Err(SpreadError::configuration(format!(
                "workers must be at most {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }

        if let Some(first) = self.first_year {
            let last = self.effective_as_of_year();
            if first > last {
                return Err(SpreadError::configuration(format!(
                    "first year {} is after as-of year {}",
                    first, last
                )));
            }
        }

        if let AccumulatorMode::Retain { max_pairs: Some(0) } = self.accumulator {
            return Err(SpreadError::configuration(
                "max_pairs must be greater than zero when retaining distances",
            ));
        }

        for correction in &self.loader.overrides {
            if correction.tolerance_degrees < 0.0 || !correction.tolerance_degrees.is_finite() {
                return Err(SpreadError::configuration(format!(
                    "override to {} has invalid tolerance {}",
                    correction.to_region, correction.tolerance_degrees
                )));
            }
        }

        Ok(())
    }
}
