//! Command-line argument definitions for the station spread tool
//!
//! This module defines the CLI interface using the clap derive API and the
//! layering of CLI flags over the default or file-based configuration.

use crate::config::{AccumulatorMode, SpreadConfig};
use crate::constants::registration_columns;
use crate::error::{Result, SpreadError};
use crate::processor::OutputFormat;
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// CLI arguments for the charging-station spread analysis
///
/// Reads a charging-station snapshot, groups stations by region and reports,
/// for every year, how many stations exist and the mean and maximum
/// great-circle distance between every pair of them.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "station_spread",
    version,
    about = "Per-region, per-year pairwise distance statistics for charging stations",
    long_about = "Reads a charging-station snapshot CSV (such as the AFDC alternative fuel \
                  station export), groups open stations by region and reports for each year \
                  the station count, the number of new stations, and the mean and maximum \
                  great-circle distance in miles across every pair of stations opened so far."
)]
pub struct Args {
    /// Station snapshot CSV file
    #[arg(value_name = "INPUT_CSV")]
    pub input: PathBuf,

    /// Output file for the per-region, per-year results
    ///
    /// Defaults to station_spread.<format> in the current directory.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (inferred from the output extension when omitted)
    #[arg(long = "format", value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Only process these regions (comma-separated list)
    #[arg(
        long = "regions",
        value_name = "LIST",
        help = "Comma-separated list of region codes, e.g. TX,CA"
    )]
    pub regions: Option<RegionList>,

    /// Last year reported for every region
    ///
    /// Defaults to the year of the reference date.
    #[arg(long = "as-of", value_name = "YEAR")]
    pub as_of: Option<i32>,

    /// First year reported for every region
    ///
    /// Defaults to each region's earliest open year. Must not be later than
    /// the earliest open year of any processed region.
    #[arg(long = "first-year", value_name = "YEAR")]
    pub first_year: Option<i32>,

    /// Date separating open stations from planned ones (YYYY-MM-DD)
    ///
    /// Stations opening, or expected to open, after this date are dropped.
    /// Defaults to today.
    #[arg(long = "reference-date", value_name = "DATE")]
    pub reference_date: Option<NaiveDate>,

    /// Keep every pairwise distance in memory alongside the statistics
    #[arg(long = "retain-distances")]
    pub retain_distances: bool,

    /// Refuse regions needing more retained distances than this
    ///
    /// Defaults to a quarter of system memory. Implies --retain-distances.
    #[arg(long = "max-pairs", value_name = "COUNT")]
    pub max_pairs: Option<u64>,

    /// Number of regions aggregated concurrently
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,

    /// JSON configuration file for column names, overrides and defaults
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// By-year registration CSV to correlate with average distance
    ///
    /// Requires exactly one processed region.
    #[arg(long = "registrations", value_name = "FILE")]
    pub registrations: Option<PathBuf>,

    /// Year column of the registration CSV
    #[arg(
        long = "registration-year-column",
        value_name = "NAME",
        default_value = registration_columns::YEAR
    )]
    pub registration_year_column: String,

    /// Count column of the registration CSV
    #[arg(
        long = "registration-count-column",
        value_name = "NAME",
        default_value = registration_columns::COUNT
    )]
    pub registration_count_column: String,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Wrapper for parsing comma-separated region lists
#[derive(Debug, Clone, PartialEq)]
pub struct RegionList {
    pub regions: Vec<String>,
}

impl FromStr for RegionList {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self> {
        let regions: Vec<String> = s
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if regions.is_empty() {
            return Err(SpreadError::configuration("Region list cannot be empty"));
        }

        Ok(RegionList { regions })
    }
}

impl Args {
    /// Validate the arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(SpreadError::InputNotFound {
                path: self.input.clone(),
            });
        }

        if self.workers == Some(0) {
            return Err(SpreadError::configuration(
                "Number of workers must be greater than 0",
            ));
        }

        if self.max_pairs == Some(0) {
            return Err(SpreadError::configuration(
                "Maximum retained pairs must be greater than 0",
            ));
        }

        if let (Some(first), Some(last)) = (self.first_year, self.as_of) {
            if first > last {
                return Err(SpreadError::configuration(format!(
                    "First year {} is after the as-of year {}",
                    first, last
                )));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(SpreadError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        if let Some(registrations) = &self.registrations {
            if !registrations.exists() {
                return Err(SpreadError::InputNotFound {
                    path: registrations.clone(),
                });
            }
        }

        if let (Some(format), Some(output)) = (self.format, &self.output) {
            if let Some(inferred) = OutputFormat::from_path(output) {
                if inferred != format {
                    return Err(SpreadError::configuration(format!(
                        "Output {} does not match format {:?}",
                        output.display(),
                        format
                    )));
                }
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Output format from the flag, the output extension, or CSV
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .or_else(|| self.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or_default()
    }

    /// Output path, defaulting to station_spread.<ext> in the working directory
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            Path::new(".").join(format!("station_spread.{}", self.output_format().extension()))
        })
    }

    /// Layer CLI flags over `base` (defaults or a config file)
    pub fn apply_to(&self, base: SpreadConfig) -> SpreadConfig {
        let mut config = base;

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(first_year) = self.first_year {
            config.first_year = Some(first_year);
        }
        if let Some(as_of) = self.as_of {
            config.as_of_year = Some(as_of);
        }

        if self.max_pairs.is_some() || self.retain_distances {
            let configured_cap = match config.accumulator {
                AccumulatorMode::Retain { max_pairs } => max_pairs,
                AccumulatorMode::Streaming => None,
            };
            config = config.with_retained_distances(self.max_pairs.or(configured_cap));
        }

        let loader = &mut config.loader;
        if let Some(reference_date) = self.reference_date {
            loader.reference_date = Some(reference_date);
        }
        if let Some(regions) = &self.regions {
            loader.regions = regions.regions.clone();
        }

        config
    }

    /// Build the run configuration: defaults, then config file, then flags
    pub fn to_config(&self) -> Result<SpreadConfig> {
        let base = match &self.config_file {
            Some(path) => SpreadConfig::from_json_file(path)?,
            None => SpreadConfig::default(),
        };

        let config = self.apply_to(base);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(extra: &[&str], input: &Path) -> Args {
        let mut argv = vec!["station_spread".to_string(), input.display().to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    fn input_file(temp_dir: &TempDir) -> PathBuf {
        let path = temp_dir.path().join("stations.csv");
        fs::write(&path, "State,Latitude,Longitude,Open Date\n").unwrap();
        path
    }

    #[test]
    fn test_region_list_parsing() {
        let result = RegionList::from_str("tx, CA ,ny").unwrap();
        assert_eq!(result.regions, vec!["TX", "CA", "NY"]);

        assert!(RegionList::from_str("").is_err());
        assert!(RegionList::from_str(",,,").is_err());
    }

    #[test]
    fn test_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let args = parse(&[], &input_file(&temp_dir));

        assert!(args.validate().is_ok());
        assert_eq!(args.output_format(), OutputFormat::Csv);
        assert_eq!(args.output_path(), Path::new(".").join("station_spread.csv"));
        assert_eq!(args.registration_year_column, "year");

        let config = args.to_config().unwrap();
        assert_eq!(config.accumulator, AccumulatorMode::Streaming);
        assert!(config.loader.regions.is_empty());
    }

    #[test]
    fn test_flags_layer_over_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let args = parse(
            &[
                "--regions",
                "tx,ca",
                "--as-of",
                "2022",
                "--first-year",
                "2010",
                "--reference-date",
                "2022-12-31",
                "--max-pairs",
                "5000",
                "-j",
                "3",
            ],
            &input_file(&temp_dir),
        );

        let config = args.to_config().unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.first_year, Some(2010));
        assert_eq!(config.as_of_year, Some(2022));
        assert_eq!(
            config.accumulator,
            AccumulatorMode::Retain {
                max_pairs: Some(5000)
            }
        );
        assert_eq!(config.loader.regions, vec!["TX", "CA"]);
        assert_eq!(
            config.loader.reference_date,
            NaiveDate::from_ymd_opt(2022, 12, 31)
        );
    }

    #[test]
    fn test_flags_layer_over_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("spread.json");
        fs::write(
            &config_path,
            r#"{ "workers": 6, "as_of_year": 2020, "accumulator": { "kind": "retain", "max_pairs": 42 } }"#,
        )
        .unwrap();

        let args = parse(
            &["--config", config_path.to_str().unwrap(), "--as-of", "2021"],
            &input_file(&temp_dir),
        );

        let config = args.to_config().unwrap();
        assert_eq!(config.workers, 6);
        assert_eq!(config.as_of_year, Some(2021));
        assert_eq!(
            config.accumulator,
            AccumulatorMode::Retain {
                max_pairs: Some(42)
            }
        );
    }

    #[test]
    fn test_validation() {
        let temp_dir = TempDir::new().unwrap();
        let input = input_file(&temp_dir);

        assert!(parse(&["-j", "0"], &input).validate().is_err());
        assert!(parse(&["--max-pairs", "0"], &input).validate().is_err());
        assert!(
            parse(&["--first-year", "2022", "--as-of", "2020"], &input)
                .validate()
                .is_err()
        );
        assert!(
            parse(&["--config", "/nonexistent/spread.json"], &input)
                .validate()
                .is_err()
        );
        assert!(
            parse(&["-o", "out.csv", "--format", "json"], &input)
                .validate()
                .is_err()
        );

        let missing = parse(&[], &temp_dir.path().join("missing.csv"));
        assert!(matches!(
            missing.validate(),
            Err(SpreadError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_output_format_inference() {
        let temp_dir = TempDir::new().unwrap();
        let input = input_file(&temp_dir);

        let args = parse(&["-o", "results.parquet"], &input);
        assert_eq!(args.output_format(), OutputFormat::Parquet);

        let args = parse(&["--format", "json"], &input);
        assert_eq!(args.output_path(), Path::new(".").join("station_spread.json"));
    }

    #[test]
    fn test_log_level() {
        let temp_dir = TempDir::new().unwrap();
        let input = input_file(&temp_dir);

        assert_eq!(parse(&[], &input).get_log_level(), "warn");
        assert_eq!(parse(&["-v"], &input).get_log_level(), "info");
        assert_eq!(parse(&["-vv"], &input).get_log_level(), "debug");
        assert_eq!(parse(&["-vvv"], &input).get_log_level(), "trace");

        let quiet = parse(&["-q"], &input);
        assert_eq!(quiet.get_log_level(), "error");
        assert!(!quiet.show_progress());
    }
}
