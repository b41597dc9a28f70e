//! Per-year progress reporting hooks for long-running regions

use crate::models::YearlyStat;
use indicatif::ProgressBar;
use tracing::debug;

/// Observer notified after every emitted [`YearlyStat`]
///
/// Year boundaries are the only points where a region's accumulator is in a
/// consistent state, so this is also where callers should checkpoint.
pub trait YearProgress: Send + Sync {
    fn year_completed(&self, region: &str, stat: &YearlyStat, pairs_so_far: u64);
}

/// Logs each completed year at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl YearProgress for TracingProgress {
    fn year_completed(&self, region: &str, stat: &YearlyStat, pairs_so_far: u64) {
        debug!(
            "{} {}: {} stations ({} new), {} pairs",
            region, stat.year, stat.total_stations, stat.new_stations, pairs_so_far
        );
    }
}

/// Shows the last completed year of a region on an indicatif bar, and logs it
#[derive(Debug, Clone)]
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl YearProgress for ProgressBarReporter {
    fn year_completed(&self, region: &str, stat: &YearlyStat, pairs_so_far: u64) {
        TracingProgress.year_completed(region, stat, pairs_so_far);
        self.bar.set_message(format!(
            "{} {} ({} stations, {} pairs)",
            region, stat.year, stat.total_stations, pairs_so_far
        ));
    }
}
