//! Concurrent per-region processing engine.
//!
//! Runs one [`StationYearDistanceAggregator`] per region on tokio's blocking
//! pool, bounded by the configured worker count, and collects the reports.
//! A failure in one region never affects another; failures are returned
//! alongside the successful reports.

pub mod writer;

#[cfg(test)]
pub mod tests;

pub use self::writer::{OutputFormat, ResultWriter};

use crate::aggregator::{
    ProgressBarReporter, StationYearDistanceAggregator, TracingProgress, YearProgress,
    estimate_pair_count,
};
use crate::config::SpreadConfig;
use crate::error::{Result, SpreadError};
use crate::models::{ProcessingStats, RegionReport, Station};

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A region whose aggregation did not complete
#[derive(Debug)]
pub struct RegionFailure {
    pub region: String,
    pub error: SpreadError,
}

/// Everything produced by one processing run
#[derive(Debug, Default)]
pub struct ProcessingOutcome {
    /// Successful reports, ordered by region code
    pub reports: Vec<RegionReport>,
    pub failures: Vec<RegionFailure>,
    pub stats: ProcessingStats,
}

impl ProcessingOutcome {
    pub fn report(&self, region: &str) -> Option<&RegionReport> {
        self.reports.iter().find(|report| report.region == region)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Aggregates many regions concurrently
#[derive(Debug)]
pub struct RegionProcessor {
    config: SpreadConfig,
    cancellation_token: CancellationToken,
    show_progress: bool,
}

impl RegionProcessor {
    pub fn new(config: SpreadConfig) -> Self {
        Self {
            config,
            cancellation_token: CancellationToken::new(),
            show_progress: false,
        }
    }

    /// Share a cancellation token with every region task
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Draw an indicatif bar over regions
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &SpreadConfig {
        &self.config
    }

    /// Year range reported for a region, `None` when it has no stations
    ///
    /// The range may be empty when the as-of year precedes the region's
    /// earliest open year; the aggregator rejects it for that region alone.
    pub fn year_range(&self, stations: &[Station]) -> Option<RangeInclusive<i32>> {
        let earliest = stations.iter().map(|s| s.open_year).min()?;
        let start = self.config.first_year.unwrap_or(earliest);
        Some(start..=self.config.effective_as_of_year())
    }

    /// Aggregate every region, returning reports ordered by region code
    pub async fn process(
        &self,
        regions: BTreeMap<String, Vec<Station>>,
    ) -> Result<ProcessingOutcome> {
        let start_time = Instant::now();
        self.config.validate()?;

        let region_count = regions.len();
        info!(
            "Aggregating {} regions with {} workers ({:?})",
            region_count, self.config.workers, self.config.accumulator
        );

        let progress_bar = self.create_progress_bar(region_count as u64);
        let year_progress: Arc<dyn YearProgress> = if self.show_progress {
            Arc::new(ProgressBarReporter::new(progress_bar.clone()))
        } else {
            Arc::new(TracingProgress)
        };

        let concurrent_limit = self.config.workers.min(region_count).max(1);

        let results: Vec<(String, Result<RegionReport>)> = stream::iter(regions)
            .map(|(region, stations)| {
                let progress_bar = progress_bar.clone();
                let years = self.year_range(&stations);
                let aggregator = StationYearDistanceAggregator::new(region.clone())
                    .with_mode(self.config.accumulator)
                    .with_cancellation(self.cancellation_token.clone())
                    .with_progress(year_progress.clone());

                async move {
                    let result = run_region(aggregator, stations, years).await;
                    progress_bar.inc(1);
                    (region, result)
                }
            })
            .buffer_unordered(concurrent_limit)
            .collect()
            .await;

        progress_bar.finish_and_clear();

        let mut outcome = ProcessingOutcome::default();
        let mut cancelled = None;

        for (region, result) in results {
            match result {
                Ok(report) => {
                    let stations = report.final_station_count();
                    outcome.stats.regions_processed += 1;
                    outcome.stats.stations_processed += stations;
                    outcome.stats.pairs_computed += estimate_pair_count(stations);
                    outcome.reports.push(report);
                }
                Err(error) if error.is_cancelled() => {
                    if cancelled.is_none() {
                        cancelled = Some(error);
                    }
                }
                Err(error) => {
                    error!("Region {} failed: {}", region, error);
                    outcome.stats.regions_failed += 1;
                    outcome.failures.push(RegionFailure { region, error });
                }
            }
        }

        if let Some(error) = cancelled {
            warn!("Processing cancelled: {}", error);
            return Err(error);
        }

        outcome.reports.sort_by(|a, b| a.region.cmp(&b.region));
        outcome.failures.sort_by(|a, b| a.region.cmp(&b.region));
        outcome.stats.processing_time_ms = start_time.elapsed().as_millis();

        info!(
            "Aggregated {} regions ({} failed), {} stations, {} pairs in {}ms",
            outcome.stats.regions_processed,
            outcome.stats.regions_failed,
            outcome.stats.stations_processed,
            outcome.stats.pairs_computed,
            outcome.stats.processing_time_ms
        );

        Ok(outcome)
    }

    fn create_progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message("Aggregating regions");
        pb
    }
}

/// Aggregate one region on the blocking pool
async fn run_region(
    aggregator: StationYearDistanceAggregator,
    stations: Vec<Station>,
    years: Option<RangeInclusive<i32>>,
) -> Result<RegionReport> {
    let region = aggregator.region().to_string();

    let Some(years) = years else {
        debug!("Region {} has no stations", region);
        return Ok(RegionReport::empty(region));
    };

    debug!(
        "Starting region {} ({} stations, {}..={})",
        region,
        stations.len(),
        years.start(),
        years.end()
    );

    task::spawn_blocking(move || aggregator.aggregate(&stations, years)).await?
}
