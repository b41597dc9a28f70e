//! Application constants for the station spread analysis
//!
//! This module contains the physical constants, default column names and
//! accepted date formats used throughout the crate.

// =============================================================================
// Geodesy
// =============================================================================

/// Mean Earth radius in statute miles used for every great-circle distance
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Valid latitude range in decimal degrees
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in decimal degrees
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

// =============================================================================
// Station CSV Columns
// =============================================================================

/// Default column names, matching the AFDC alternative fuel station export
pub mod columns {
    pub const ID: &str = "ID";
    pub const REGION: &str = "State";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const OPEN_DATE: &str = "Open Date";
    pub const EXPECTED_DATE: &str = "Expected Date";
}

/// Default column names for a by-year registration series
pub mod registration_columns {
    pub const YEAR: &str = "year";
    pub const COUNT: &str = "registrations";
}

/// Output column names shared by every result writer
pub mod output_columns {
    pub const REGION: &str = "region";
    pub const YEAR: &str = "year";
    pub const TOTAL_STATIONS: &str = "total_stations";
    pub const NEW_STATIONS: &str = "new_stations";
    pub const AVERAGE_DISTANCE: &str = "average_distance_miles";
    pub const MAXIMUM_DISTANCE: &str = "maximum_distance_miles";
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Date-only formats accepted for open and expected dates, tried in order
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Datetime formats accepted when a date column carries a time component
pub const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Tokens treated as a missing value in any input column
pub const MISSING_VALUE_TOKENS: &[&str] = &["", "NA", "N/A", "null", "NULL"];

// =============================================================================
// Resource Sizing
// =============================================================================

/// Bytes held per retained distance
pub const BYTES_PER_DISTANCE: u64 = std::mem::size_of::<f64>() as u64;

/// Upper bound on concurrently aggregated regions
pub const MAX_WORKERS: usize = 1024;

/// Fraction of system memory the retained distances may use by default
pub const RETAIN_MEMORY_FRACTION: u64 = 4;

/// Fallback retain cap when system memory cannot be detected (~800 MB)
pub const DEFAULT_MAX_RETAINED_PAIRS: u64 = 100_000_000;

/// Default region override match tolerance in decimal degrees
pub const DEFAULT_OVERRIDE_TOLERANCE_DEGREES: f64 = 1e-4;
