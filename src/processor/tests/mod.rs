//! Tests for the processor module
//!
//! Exercises concurrent region aggregation and result writing using small
//! in-memory station sets and temporary output files.

use crate::config::SpreadConfig;
use crate::models::Station;
use std::collections::BTreeMap;


/// Create a valid test station
pub fn station(id: &str, region: &str, lat: f64, lon: f64, open_year: i32) -> Station {
    Station::new(id, region, lat, lon, open_year).unwrap()
}

/// Three small regions with known layouts
pub fn sample_regions() -> BTreeMap<String, Vec<Station>> {
    let mut regions = BTreeMap::new();
    regions.insert(
        "TX".to_string(),
        vec![
            station("P1", "TX", 30.0, -97.0, 2020),
            station("P2", "TX", 30.0, -96.0, 2021),
            station("P3", "TX", 31.0, -97.0, 2021),
        ],
    );
    regions.insert(
        "CA".to_string(),
        vec![
            station("C1", "CA", 34.05, -118.25, 2019),
            station("C2", "CA", 37.77, -122.42, 2019),
            station("C3", "CA", 38.58, -121.49, 2021),
            station("C4", "CA", 32.72, -117.16, 2022),
        ],
    );
    regions.insert(
        "VT".to_string(),
        vec![station("V1", "VT", 44.26, -72.58, 2021)],
    );
    regions
}

/// Configuration pinned to 2022 with two workers
pub fn test_config() -> SpreadConfig {
    SpreadConfig::default()
        .with_workers(2)
        .with_as_of_year(2022)
}
