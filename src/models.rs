//! Core data structures for the station spread analysis.
//!
//! Defines the station input record, the per-year output record, the
//! per-region report, and the loading and processing statistics used
//! throughout the library.

use crate::constants::{LATITUDE_RANGE, LONGITUDE_RANGE};
use crate::distance::great_circle_miles;
use crate::error::{Result, SpreadError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A geocoded charging station with the year it became operational
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub open_year: i32,
}

impl Station {
    /// Create a station, rejecting coordinates outside the valid degree ranges
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        latitude: f64,
        longitude: f64,
        open_year: i32,
    ) -> Result<Self> {
        let id = id.into();
        let region = region.into();

        if region.trim().is_empty() {
            return Err(SpreadError::invalid_input(
                region,
                format!("station {} has an empty region", id),
            ));
        }
        if !latitude.is_finite() || !LATITUDE_RANGE.contains(&latitude) {
            return Err(SpreadError::invalid_input(
                region,
                format!("station {} has latitude {} outside [-90, 90]", id, latitude),
            ));
        }
        if !longitude.is_finite() || !LONGITUDE_RANGE.contains(&longitude) {
            return Err(SpreadError::invalid_input(
                region,
                format!(
                    "station {} has longitude {} outside [-180, 180]",
                    id, longitude
                ),
            ));
        }

        Ok(Self {
            id,
            region,
            latitude,
            longitude,
            open_year,
        })
    }

    /// Great-circle distance to another station in statute miles
    pub fn distance_to(&self, other: &Station) -> f64 {
        great_circle_miles(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Station counts and pairwise distance statistics for one region and year
///
/// `None` distances mean the statistic is undefined because fewer than two
/// stations exist through that year. They are never written as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyStat {
    pub year: i32,
    pub total_stations: usize,
    pub new_stations: usize,
    pub average_distance: Option<f64>,
    pub maximum_distance: Option<f64>,
}

impl YearlyStat {
    /// A year whose distance statistics are undefined
    pub fn undefined(year: i32, total_stations: usize, new_stations: usize) -> Self {
        Self {
            year,
            total_stations,
            new_stations,
            average_distance: None,
            maximum_distance: None,
        }
    }

    /// Whether mean and maximum distance are defined for this year
    pub fn has_distances(&self) -> bool {
        self.average_distance.is_some() && self.maximum_distance.is_some()
    }
}

/// Aggregation output for a single region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub region: String,

    /// One entry per requested year, in increasing year order
    pub stats: Vec<YearlyStat>,

    /// Distances appended to the accumulator in each year, when retained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distances_by_year: Option<BTreeMap<i32, Vec<f64>>>,
}

impl RegionReport {
    pub fn empty(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            stats: Vec::new(),
            distances_by_year: None,
        }
    }

    /// Stat for a specific year, if it was part of the requested range
    pub fn stat_for(&self, year: i32) -> Option<&YearlyStat> {
        self.stats.iter().find(|stat| stat.year == year)
    }

    /// Every retained distance considered through `year` (inclusive)
    ///
    /// Returns `None` when the report was produced in streaming mode.
    pub fn distances_through(&self, year: i32) -> Option<Vec<f64>> {
        self.distances_by_year.as_ref().map(|by_year| {
            by_year
                .range(..=year)
                .flat_map(|(_, distances)| distances.iter().copied())
                .collect()
        })
    }

    /// Final station count for the region at the end of the range
    pub fn final_station_count(&self) -> usize {
        self.stats.last().map_or(0, |stat| stat.total_stations)
    }
}

/// Counters describing what the station loader kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadStats {
    pub rows_read: usize,
    pub stations_kept: usize,
    pub dropped_missing_region: usize,
    pub dropped_bad_coordinates: usize,
    pub dropped_bad_open_date: usize,
    pub dropped_not_yet_open: usize,
    pub dropped_region_filter: usize,
    pub region_overrides_applied: usize,
}

impl LoadStats {
    /// Total rows rejected for any reason
    pub fn total_dropped(&self) -> usize {
        self.dropped_missing_region
            + self.dropped_bad_coordinates
            + self.dropped_bad_open_date
            + self.dropped_not_yet_open
            + self.dropped_region_filter
    }

    /// Percentage of rows kept
    pub fn keep_rate(&self) -> f64 {
        if self.rows_read == 0 {
            0.0
        } else {
            (self.stations_kept as f64 / self.rows_read as f64) * 100.0
        }
    }
}

/// Processing statistics for a run over many regions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStats {
    pub regions_processed: usize,
    pub regions_failed: usize,
    pub stations_processed: usize,
    pub pairs_computed: u64,
    pub processing_time_ms: u128,
}
