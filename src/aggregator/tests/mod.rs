//! Shared test utilities and fixtures for aggregator tests

use crate::models::Station;

pub mod scenario_tests;

/// Create a valid test station
pub fn station(id: &str, region: &str, lat: f64, lon: f64, open_year: i32) -> Station {
    Station::new(id, region, lat, lon, open_year).unwrap()
}

/// The three-station Texas fixture: P1 in 2020, P2 and P3 in 2021
pub fn three_station_region() -> Vec<Station> {
    vec![
        station("P1", "TX", 30.0, -97.0, 2020),
        station("P2", "TX", 30.0, -96.0, 2021),
        station("P3", "TX", 31.0, -97.0, 2021),
    ]
}

/// Deterministic pseudo-random stations spread over a bounding box
///
/// Uses a fixed linear congruential sequence so fixtures are identical
/// across runs without pulling in a random number crate.
pub fn scattered_stations(region: &str, count: usize, first_year: i32, years: i32) -> Vec<Station> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|i| {
            let lat = 25.0 + next() * 12.0;
            let lon = -106.0 + next() * 12.0;
            let year = first_year + (next() * years as f64) as i32;
            station(&format!("{}-{}", region, i), region, lat, lon, year)
        })
        .collect()
}

/// Mean and maximum of a slice by direct evaluation
pub fn direct_mean_max(distances: &[f64]) -> (f64, f64) {
    let sum: f64 = distances.iter().sum();
    let max = distances.iter().copied().fold(f64::MIN, f64::max);
    (sum / distances.len() as f64, max)
}

/// Every pairwise distance among `stations`, computed naively
pub fn all_pair_distances(stations: &[&Station]) -> Vec<f64> {
    let mut distances = Vec::new();
    for (i, a) in stations.iter().enumerate() {
        for b in &stations[i + 1..] {
            distances.push(a.distance_to(b));
        }
    }
    distances
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}
