//! Year-over-year changes and correlation against registration counts.
//!
//! Downstream analysis of a [`RegionReport`]: percentage change between
//! consecutive years and Pearson correlation between average station
//! distance and a by-year series such as EV registrations.

use crate::error::Result;
use crate::loader::fields::{clean, read_string_frame, required_column};
use crate::models::{RegionReport, YearlyStat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Percentage change from `previous` to `current`
///
/// `None` when either value is undefined or `previous` is zero.
pub fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(current), Some(previous)) if previous != 0.0 => {
            Some((current / previous - 1.0) * 100.0)
        }
        _ => None,
    }
}

/// Percentage changes of one year's statistics against the previous year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyChange {
    pub year: i32,
    pub total_stations_pct: Option<f64>,
    pub average_distance_pct: Option<f64>,
    pub maximum_distance_pct: Option<f64>,
}

/// Year-over-year changes for consecutive stats; the first year has none
pub fn year_over_year(stats: &[YearlyStat]) -> Vec<YearlyChange> {
    let mut previous: Option<&YearlyStat> = None;

    stats
        .iter()
        .map(|stat| {
            let change = YearlyChange {
                year: stat.year,
                total_stations_pct: pct_change(
                    Some(stat.total_stations as f64),
                    previous.map(|p| p.total_stations as f64),
                ),
                average_distance_pct: pct_change(
                    stat.average_distance,
                    previous.and_then(|p| p.average_distance),
                ),
                maximum_distance_pct: pct_change(
                    stat.maximum_distance,
                    previous.and_then(|p| p.maximum_distance),
                ),
            };
            previous = Some(stat);
            change
        })
        .collect()
}

/// Pearson correlation coefficient of two equally long samples
///
/// `None` for fewer than two points, mismatched lengths or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let sum_xy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();
    let variance_x: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    let variance_y: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();

    if variance_x == 0.0 || variance_y == 0.0 {
        return None;
    }

    Some(sum_xy / (variance_x.sqrt() * variance_y.sqrt()))
}

/// A by-year count series, such as vehicle registrations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSeries {
    pub by_year: BTreeMap<i32, f64>,
}

impl RegistrationSeries {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, f64)>) -> Self {
        Self {
            by_year: pairs.into_iter().collect(),
        }
    }

    /// Read the series from a CSV file with a year column and a count column
    ///
    /// Rows with an unparseable year or count are skipped. Counts may carry
    /// thousands separators. A repeated year keeps the last value.
    pub fn load(path: &Path, year_column: &str, count_column: &str) -> Result<Self> {
        let df = read_string_frame(path)?;
        let years = required_column(&df, year_column, path)?;
        let counts = required_column(&df, count_column, path)?;

        let mut series = Self::default();
        let mut skipped = 0usize;

        for (year, count) in years.iter().zip(&counts) {
            let year = clean(year.as_deref()).and_then(|v| v.parse::<i32>().ok());
            let count = clean(count.as_deref())
                .and_then(|v| v.replace(',', "").parse::<f64>().ok())
                .filter(|v| v.is_finite());

            match (year, count) {
                (Some(year), Some(count)) => {
                    series.by_year.insert(year, count);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                "Skipped {} unparseable registration rows in {}",
                skipped,
                path.display()
            );
        }
        debug!(
            "Loaded {} registration years from {}",
            series.len(),
            path.display()
        );

        Ok(series)
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.by_year.get(&year).copied()
    }

    pub fn len(&self) -> usize {
        self.by_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }
}

/// Correlation between a region's average distance and a registration series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub region: String,

    /// Years with both a defined average distance and a registration count
    pub joined_years: Vec<i32>,

    /// Pearson r between average distance and registrations
    pub level_correlation: Option<f64>,

    /// Pearson r between their year-over-year growth rates
    pub growth_correlation: Option<f64>,
}

/// Join a report with a registration series by year and correlate them
pub fn correlate(report: &RegionReport, registrations: &RegistrationSeries) -> CorrelationSummary {
    let joined: Vec<(i32, f64, f64)> = report
        .stats
        .iter()
        .filter_map(|stat| {
            let distance = stat.average_distance?;
            let count = registrations.get(stat.year)?;
            Some((stat.year, distance, count))
        })
        .collect();

    let distances: Vec<f64> = joined.iter().map(|(_, d, _)| *d).collect();
    let counts: Vec<f64> = joined.iter().map(|(_, _, c)| *c).collect();

    // Growth only between consecutive calendar years present in the join
    let (distance_growth, count_growth): (Vec<f64>, Vec<f64>) = joined
        .windows(2)
        .filter(|pair| pair[1].0 == pair[0].0 + 1)
        .filter_map(|pair| {
            let distance = pct_change(Some(pair[1].1), Some(pair[0].1))?;
            let count = pct_change(Some(pair[1].2), Some(pair[0].2))?;
            Some((distance, count))
        })
        .unzip();

    CorrelationSummary {
        region: report.region.clone(),
        joined_years: joined.iter().map(|(year, _, _)| *year).collect(),
        level_correlation: pearson(&distances, &counts),
        growth_correlation: pearson(&distance_growth, &count_growth),
    }
}
