//! Command implementation for the station spread CLI
//!
//! This module contains the run workflow (load, aggregate, write, correlate),
//! logging setup and the coloured summary printed at the end of a run.

use crate::cli::args::Args;
use crate::error::{Result, SpreadError};
use crate::loader::StationLoader;
use crate::models::{LoadStats, ProcessingStats, RegionReport};
use crate::processor::{RegionFailure, RegionProcessor, ResultWriter};
use crate::report::{CorrelationSummary, RegistrationSeries, correlate, year_over_year};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything a run produced, for reporting and exit-code decisions
#[derive(Debug, Default)]
pub struct RunSummary {
    pub load: LoadStats,
    pub processing: ProcessingStats,
    pub failures: Vec<RegionFailure>,
    pub output_path: PathBuf,
    pub rows_written: usize,
    pub correlation: Option<CorrelationSummary>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Main command runner
///
/// 1. Set up logging and layered configuration
/// 2. Load and clean the station snapshot
/// 3. Aggregate every region concurrently
/// 4. Write the results and optionally correlate with registrations
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<RunSummary> {
    let start_time = Instant::now();

    setup_logging(&args);
    info!("Starting station spread analysis");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = args.to_config()?;
    debug!("Loaded configuration: {:?}", config);

    let loader = StationLoader::new(config.loader.clone());
    let input = args.input.clone();
    let loaded = task::spawn_blocking(move || loader.load(&input)).await??;

    let processor = RegionProcessor::new(config)
        .with_cancellation(cancellation_token)
        .with_progress(args.show_progress());
    let outcome = processor.process(loaded.regions).await?;

    let output_path = args.output_path();
    let writer = ResultWriter::new(args.output_format());
    let reports = outcome.reports;
    let write_path = output_path.clone();
    let (reports, rows_written) = task::spawn_blocking(move || {
        let rows = writer.write(&reports, &write_path)?;
        Ok::<_, SpreadError>((reports, rows))
    })
    .await??;
    info!("Wrote {} rows to {}", rows_written, output_path.display());

    let correlation = match &args.registrations {
        Some(path) => {
            let report = single_report(&reports)?;
            let series = RegistrationSeries::load(
                path,
                &args.registration_year_column,
                &args.registration_count_column,
            )?;
            Some(correlate(report, &series))
        }
        None => None,
    };

    let summary = RunSummary {
        load: loaded.stats,
        processing: outcome.stats,
        failures: outcome.failures,
        output_path,
        rows_written,
        correlation,
    };

    if !args.quiet {
        if let [report] = reports.as_slice() {
            print_region_table(report);
        }
        print_summary(&summary);
    }

    debug!("Run finished in {}ms", start_time.elapsed().as_millis());
    Ok(summary)
}

/// The only report of a run, required for correlation
fn single_report(reports: &[RegionReport]) -> Result<&RegionReport> {
    match reports {
        [report] => Ok(report),
        _ => Err(SpreadError::configuration(format!(
            "Correlation needs exactly one region, but {} were processed (use --regions)",
            reports.len()
        ))),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("station_spread={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber may already be installed when run more than once in-process
    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

fn format_optional(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}{}", v, suffix))
}

/// Print one region's years with their year-over-year changes
fn print_region_table(report: &RegionReport) {
    println!(
        "\n{} {}",
        "Region".bright_green().bold(),
        report.region.bright_white().bold()
    );
    println!(
        "  {:>6} {:>8} {:>6} {:>10} {:>10} {:>9} {:>9}",
        "year", "stations", "new", "avg mi", "max mi", "Δ avg", "Δ max"
    );

    for (stat, change) in report.stats.iter().zip(year_over_year(&report.stats)) {
        println!(
            "  {:>6} {:>8} {:>6} {:>10} {:>10} {:>9} {:>9}",
            stat.year,
            stat.total_stations,
            stat.new_stations,
            format_optional(stat.average_distance, ""),
            format_optional(stat.maximum_distance, ""),
            format_optional(change.average_distance_pct, "%"),
            format_optional(change.maximum_distance_pct, "%"),
        );
    }
}

/// Print the coloured end-of-run summary
fn print_summary(summary: &RunSummary) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {} of {} ({:.1}%)",
        "Stations kept:".bright_cyan(),
        summary.load.stations_kept.to_string().bright_white().bold(),
        summary.load.rows_read,
        summary.load.keep_rate()
    );
    if summary.load.total_dropped() > 0 {
        println!(
            "  {} {} (region {}, coordinates {}, open date {}, not yet open {}, filtered {})",
            "Rows dropped:".bright_yellow(),
            summary.load.total_dropped(),
            summary.load.dropped_missing_region,
            summary.load.dropped_bad_coordinates,
            summary.load.dropped_bad_open_date,
            summary.load.dropped_not_yet_open,
            summary.load.dropped_region_filter
        );
    }
    if summary.load.region_overrides_applied > 0 {
        println!(
            "  {} {}",
            "Region overrides:".bright_cyan(),
            summary.load.region_overrides_applied
        );
    }
    println!(
        "  {} {}",
        "Regions processed:".bright_cyan(),
        summary
            .processing
            .regions_processed
            .to_string()
            .bright_white()
    );
    for failure in &summary.failures {
        println!(
            "  {} {}: {}",
            "Region failed:".bright_red(),
            failure.region.bright_red().bold(),
            failure.error
        );
    }
    println!(
        "  {} {}",
        "Station pairs:".bright_cyan(),
        summary.processing.pairs_computed.to_string().bright_white()
    );
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        summary.processing.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {} ({} rows)",
        "Output:".bright_cyan(),
        summary.output_path.display(),
        summary.rows_written
    );

    if let Some(correlation) = &summary.correlation {
        println!(
            "\n{} {}",
            "Registration correlation".bright_green().bold(),
            correlation.region.bright_white().bold()
        );
        println!(
            "  {} {}",
            "Joined years:".bright_cyan(),
            correlation.joined_years.len()
        );
        println!(
            "  {} {}",
            "Average distance vs registrations:".bright_cyan(),
            correlation
                .level_correlation
                .map_or_else(|| "undefined".to_string(), |r| format!("r = {:.3}", r))
        );
        println!(
            "  {} {}",
            "Year-over-year growth:".bright_cyan(),
            correlation
                .growth_correlation
                .map_or_else(|| "undefined".to_string(), |r| format!("r = {:.3}", r))
        );
    }
}
