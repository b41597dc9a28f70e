//! Concrete aggregation scenarios and error cases

use super::{assert_close, station, three_station_region};
use crate::aggregator::{StationYearDistanceAggregator, YearProgress, aggregate};
use crate::config::AccumulatorMode;
use crate::distance::great_circle_miles;
use crate::error::SpreadError;
use crate::models::YearlyStat;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Purpose: Verify the three-station walkthrough year by year
/// Benefit: Pins down undefined years, new-station counts and carry-forward
#[test]
fn test_three_station_scenario() {
    let stats = aggregate("TX", &three_station_region(), 2020..=2022).unwrap();

    assert_eq!(stats.len(), 3);

    assert_eq!(stats[0].year, 2020);
    assert_eq!(stats[0].total_stations, 1);
    assert_eq!(stats[0].new_stations, 1);
    assert_eq!(stats[0].average_distance, None);
    assert_eq!(stats[0].maximum_distance, None);

    let p1_p2 = great_circle_miles(30.0, -97.0, 30.0, -96.0);
    let p1_p3 = great_circle_miles(30.0, -97.0, 31.0, -97.0);
    let p2_p3 = great_circle_miles(30.0, -96.0, 31.0, -97.0);

    assert_eq!(stats[1].year, 2021);
    assert_eq!(stats[1].total_stations, 3);
    assert_eq!(stats[1].new_stations, 2);
    assert_close(
        stats[1].average_distance.unwrap(),
        (p1_p2 + p1_p3 + p2_p3) / 3.0,
        1e-9,
    );
    assert_close(
        stats[1].maximum_distance.unwrap(),
        p1_p2.max(p1_p3).max(p2_p3),
        1e-9,
    );

    assert_eq!(stats[2].year, 2022);
    assert_eq!(stats[2].total_stations, 3);
    assert_eq!(stats[2].new_stations, 0);
    assert_eq!(stats[2].average_distance, stats[1].average_distance);
    assert_eq!(stats[2].maximum_distance, stats[1].maximum_distance);
}

#[test]
fn test_scenario_magnitudes() {
    let stats = aggregate("TX", &three_station_region(), 2020..=2022).unwrap();

    // One degree of longitude at 30N is ~59.8 mi, one degree of latitude ~69.1 mi
    let max = stats[1].maximum_distance.unwrap();
    let mean = stats[1].average_distance.unwrap();
    assert!(max > 90.0 && max < 93.0, "max was {}", max);
    assert!(mean > 72.0 && mean < 75.0, "mean was {}", mean);
}

#[test]
fn test_range_before_first_station() {
    let stats = aggregate("TX", &three_station_region(), 2018..=2020).unwrap();

    assert_eq!(stats.len(), 3);
    assert_eq!(stats[0], YearlyStat::undefined(2018, 0, 0));
    assert_eq!(stats[1], YearlyStat::undefined(2019, 0, 0));
    assert_eq!(stats[2], YearlyStat::undefined(2020, 1, 1));
}

#[test]
fn test_stations_after_range_end_ignored() {
    let stats = aggregate("TX", &three_station_region(), 2020..=2020).unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_stations, 1);
}

#[test]
fn test_single_station_stays_undefined() {
    let stations = vec![station("solo", "VT", 44.26, -72.58, 2015)];
    let stats = aggregate("VT", &stations, 2015..=2020).unwrap();

    assert_eq!(stats.len(), 6);
    for stat in &stats {
        assert_eq!(stat.total_stations, 1);
        assert!(!stat.has_distances());
    }
    assert_eq!(stats[0].new_stations, 1);
    assert!(stats[1..].iter().all(|s| s.new_stations == 0));
}

#[test]
fn test_duplicate_coordinates_give_zero() {
    let stations = vec![
        station("a", "CO", 39.7392, -104.9903, 2019),
        station("b", "CO", 39.7392, -104.9903, 2019),
    ];
    let stats = aggregate("CO", &stations, 2019..=2019).unwrap();

    assert_eq!(stats[0].average_distance, Some(0.0));
    assert_eq!(stats[0].maximum_distance, Some(0.0));
}

#[test]
fn test_empty_input_returns_empty_result() {
    let stats = aggregate("TX", &[], 2020..=2022).unwrap();
    assert!(stats.is_empty());

    // Empty input short-circuits before the range is checked
    #[allow(clippy::reversed_empty_ranges)]
    let reversed = aggregate("TX", &[], 2022..=2020).unwrap();
    assert!(reversed.is_empty());
}

#[test]
fn test_region_mismatch_rejected() {
    let mut stations = three_station_region();
    stations.push(station("X", "OK", 35.0, -97.0, 2020));

    let result = aggregate("TX", &stations, 2020..=2022);
    match result {
        Err(SpreadError::InvalidInput { region, reason }) => {
            assert_eq!(region, "TX");
            assert!(reason.contains("OK"));
        }
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_start_after_earliest_open_year_rejected() {
    let result = aggregate("TX", &three_station_region(), 2021..=2022);
    assert!(matches!(result, Err(SpreadError::InvalidInput { .. })));
}

#[test]
fn test_empty_range_rejected() {
    #[allow(clippy::reversed_empty_ranges)]
    let result = aggregate("TX", &three_station_region(), 2020..=2019);
    assert!(matches!(result, Err(SpreadError::InvalidInput { .. })));
}

#[test]
fn test_cancelled_token_stops_at_first_year() {
    let token = CancellationToken::new();
    token.cancel();

    let result = StationYearDistanceAggregator::new("TX")
        .with_cancellation(token)
        .aggregate(&three_station_region(), 2020..=2022);

    match result {
        Err(err @ SpreadError::Cancelled { .. }) => {
            assert!(err.is_cancelled());
            if let SpreadError::Cancelled { region, year } = err {
                assert_eq!(region, "TX");
                assert_eq!(year, 2020);
            }
        }
        other => panic!("expected Cancelled, got {:?}", other),
    }
}

#[test]
fn test_uncancelled_token_runs_to_completion() {
    let token = CancellationToken::new();
    let report = StationYearDistanceAggregator::new("TX")
        .with_cancellation(token)
        .aggregate(&three_station_region(), 2020..=2022)
        .unwrap();

    assert_eq!(report.stats.len(), 3);
}

#[test]
fn test_retain_limit_exceeded() {
    let result = StationYearDistanceAggregator::new("TX")
        .with_mode(AccumulatorMode::Retain { max_pairs: Some(2) })
        .aggregate(&three_station_region(), 2020..=2022);

    match result {
        Err(SpreadError::MemoryLimitExceeded {
            region,
            estimated_pairs,
            limit,
        }) => {
            assert_eq!(region, "TX");
            assert_eq!(estimated_pairs, 3);
            assert_eq!(limit, 2);
        }
        other => panic!("expected MemoryLimitExceeded, got {:?}", other),
    }
}

#[test]
fn test_retain_limit_counts_only_stations_in_range() {
    // Only P1 opens by 2020, so nothing needs retaining
    let report = StationYearDistanceAggregator::new("TX")
        .with_mode(AccumulatorMode::Retain { max_pairs: Some(1) })
        .aggregate(&three_station_region(), 2020..=2020)
        .unwrap();

    assert_eq!(report.distances_through(2020), Some(Vec::new()));
}

#[derive(Default)]
struct RecordingProgress {
    seen: Mutex<Vec<(String, i32, u64)>>,
}

impl YearProgress for RecordingProgress {
    fn year_completed(&self, region: &str, stat: &YearlyStat, pairs_so_far: u64) {
        self.seen
            .lock()
            .unwrap()
            .push((region.to_string(), stat.year, pairs_so_far));
    }
}

#[test]
fn test_progress_reported_once_per_year() {
    let progress = Arc::new(RecordingProgress::default());

    StationYearDistanceAggregator::new("TX")
        .with_progress(progress.clone())
        .aggregate(&three_station_region(), 2019..=2022)
        .unwrap();

    let seen = progress.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ("TX".to_string(), 2019, 0),
            ("TX".to_string(), 2020, 0),
            ("TX".to_string(), 2021, 3),
            ("TX".to_string(), 2022, 3),
        ]
    );
}
