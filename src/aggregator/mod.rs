//! Year-by-year pairwise distance aggregation for one region.
//!
//! For every year in a requested range the aggregator reports how many
//! stations exist, how many opened that year, and the mean and maximum
//! great-circle distance across every pair of stations opened so far.
//!
//! Each station pair is computed exactly once: in the year the later of the
//! two stations opened. Total work for N stations is O(N²), the same as a
//! single full pairwise pass.

pub mod accumulator;
pub mod progress;

#[cfg(test)]
pub mod tests;

pub use accumulator::{DistanceAccumulator, estimate_pair_count, estimate_retained_bytes};
pub use progress::{ProgressBarReporter, TracingProgress, YearProgress};

use crate::config::AccumulatorMode;
use crate::error::{Result, SpreadError};
use crate::models::{RegionReport, Station, YearlyStat};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Aggregates pairwise station distances per year for a single region
#[derive(Clone)]
pub struct StationYearDistanceAggregator {
    region: String,
    mode: AccumulatorMode,
    cancellation_token: Option<CancellationToken>,
    progress: Option<Arc<dyn YearProgress>>,
}

impl std::fmt::Debug for StationYearDistanceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationYearDistanceAggregator")
            .field("region", &self.region)
            .field("mode", &self.mode)
            .field("cancellable", &self.cancellation_token.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl StationYearDistanceAggregator {
    /// Create an aggregator for `region` in streaming mode
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            mode: AccumulatorMode::Streaming,
            cancellation_token: None,
            progress: None,
        }
    }

    /// Choose whether raw distances are retained alongside the statistics
    pub fn with_mode(mut self, mode: AccumulatorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check `token` before each year and abort once it is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Report every completed year to `progress`
    pub fn with_progress(mut self, progress: Arc<dyn YearProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Compute one [`YearlyStat`] per year of `years`, in increasing order
    ///
    /// Fails with `InvalidInput` if any station belongs to another region, if
    /// `years` is empty, or if `years` starts after the earliest open year.
    /// An empty station list yields an empty report.
    pub fn aggregate(
        &self,
        stations: &[Station],
        years: RangeInclusive<i32>,
    ) -> Result<RegionReport> {
        if stations.is_empty() {
            return Ok(RegionReport::empty(&self.region));
        }

        self.validate(stations, &years)?;

        let opened_by_year = group_by_open_year(stations, *years.end());
        self.check_memory_budget(&opened_by_year)?;

        let mut accumulator = match self.mode {
            AccumulatorMode::Streaming => DistanceAccumulator::streaming(),
            AccumulatorMode::Retain { .. } => DistanceAccumulator::retaining(),
        };
        let mut opened: Vec<&Station> = Vec::new();
        let mut stats = Vec::with_capacity(years.clone().count());

        for year in years {
            if let Some(token) = &self.cancellation_token {
                if token.is_cancelled() {
                    debug!("Aggregation for {} cancelled before {}", self.region, year);
                    return Err(SpreadError::Cancelled {
                        region: self.region.clone(),
                        year,
                    });
                }
            }

            let new: &[&Station] = opened_by_year
                .get(&year)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let total = opened.len() + new.len();
            accumulator.open_year(year);

            let stat = if total < 2 {
                YearlyStat::undefined(year, total, new.len())
            } else {
                for (i, a) in new.iter().enumerate() {
                    for b in &new[i + 1..] {
                        accumulator.push(year, a.distance_to(b));
                    }
                }
                for old in &opened {
                    for b in new {
                        accumulator.push(year, old.distance_to(b));
                    }
                }

                YearlyStat {
                    year,
                    total_stations: total,
                    new_stations: new.len(),
                    average_distance: accumulator.mean(),
                    maximum_distance: accumulator.max(),
                }
            };

            opened.extend_from_slice(new);

            if let Some(progress) = &self.progress {
                progress.year_completed(&self.region, &stat, accumulator.len());
            }
            stats.push(stat);
        }

        debug!(
            "Aggregated {} years for {}: {} stations, {} pairs",
            stats.len(),
            self.region,
            opened.len(),
            accumulator.len()
        );

        Ok(RegionReport {
            region: self.region.clone(),
            stats,
            distances_by_year: accumulator.into_retained(),
        })
    }

    fn validate(&self, stations: &[Station], years: &RangeInclusive<i32>) -> Result<()> {
        if let Some(stranger) = stations.iter().find(|s| s.region != self.region) {
            return Err(SpreadError::invalid_input(
                &self.region,
                format!(
                    "station {} belongs to region {}",
                    stranger.id, stranger.region
                ),
            ));
        }

        if years.is_empty() {
            return Err(SpreadError::invalid_input(
                &self.region,
                format!(
                    "year range {}..={} is empty",
                    years.start(),
                    years.end()
                ),
            ));
        }

        // Non-empty input, so a minimum exists
        let earliest = stations.iter().map(|s| s.open_year).min().unwrap_or(i32::MIN);
        if *years.start() > earliest {
            return Err(SpreadError::invalid_input(
                &self.region,
                format!(
                    "year range starts at {} but a station opened in {}",
                    years.start(),
                    earliest
                ),
            ));
        }

        Ok(())
    }

    fn check_memory_budget(&self, opened_by_year: &BTreeMap<i32, Vec<&Station>>) -> Result<()> {
        let AccumulatorMode::Retain {
            max_pairs: Some(limit),
        } = self.mode
        else {
            return Ok(());
        };

        let counted: usize = opened_by_year.values().map(Vec::len).sum();
        let estimated_pairs = estimate_pair_count(counted);
        if estimated_pairs > limit {
            return Err(SpreadError::MemoryLimitExceeded {
                region: self.region.clone(),
                estimated_pairs,
                limit,
            });
        }

        debug!(
            "Retaining up to {} distances for {} (~{} bytes)",
            estimated_pairs,
            self.region,
            estimate_retained_bytes(counted)
        );
        Ok(())
    }
}

/// Stations grouped by open year, ignoring those opening after `last_year`
fn group_by_open_year(stations: &[Station], last_year: i32) -> BTreeMap<i32, Vec<&Station>> {
    let mut by_year: BTreeMap<i32, Vec<&Station>> = BTreeMap::new();
    for station in stations.iter().filter(|s| s.open_year <= last_year) {
        by_year.entry(station.open_year).or_default().push(station);
    }
    by_year
}

/// Aggregate a region's stations in streaming mode
pub fn aggregate(
    region: &str,
    stations: &[Station],
    years: RangeInclusive<i32>,
) -> Result<Vec<YearlyStat>> {
    StationYearDistanceAggregator::new(region)
        .aggregate(stations, years)
        .map(|report| report.stats)
}
