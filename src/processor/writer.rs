//! Result writing module for region reports
//!
//! Flattens reports into one row per region and year and writes them as
//! CSV or Parquet through polars, or as a JSON array through serde_json.
//! Undefined distance statistics are written as nulls, never as zero.

use crate::constants::output_columns;
use crate::error::Result;
use crate::models::RegionReport;

use polars::prelude::{Column, CsvWriter, DataFrame, ParquetWriter, SerWriter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Supported output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
    Json,
}

impl OutputFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Json => "json",
        }
    }
}

/// One output row: a region's statistics for a single year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub region: String,
    pub year: i32,
    pub total_stations: u64,
    pub new_stations: u64,
    pub average_distance_miles: Option<f64>,
    pub maximum_distance_miles: Option<f64>,
}

/// Flatten reports into rows, region by region in year order
pub fn to_rows(reports: &[RegionReport]) -> Vec<OutputRow> {
    reports
        .iter()
        .flat_map(|report| {
            report.stats.iter().map(move |stat| OutputRow {
                region: report.region.clone(),
                year: stat.year,
                total_stations: stat.total_stations as u64,
                new_stations: stat.new_stations as u64,
                average_distance_miles: stat.average_distance,
                maximum_distance_miles: stat.maximum_distance,
            })
        })
        .collect()
}

/// Build a polars frame with the standard output columns
pub fn to_dataframe(rows: &[OutputRow]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            output_columns::REGION.into(),
            rows.iter().map(|r| r.region.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            output_columns::YEAR.into(),
            rows.iter().map(|r| r.year).collect::<Vec<_>>(),
        ),
        Column::new(
            output_columns::TOTAL_STATIONS.into(),
            rows.iter().map(|r| r.total_stations).collect::<Vec<_>>(),
        ),
        Column::new(
            output_columns::NEW_STATIONS.into(),
            rows.iter().map(|r| r.new_stations).collect::<Vec<_>>(),
        ),
        Column::new(
            output_columns::AVERAGE_DISTANCE.into(),
            rows.iter()
                .map(|r| r.average_distance_miles)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            output_columns::MAXIMUM_DISTANCE.into(),
            rows.iter()
                .map(|r| r.maximum_distance_miles)
                .collect::<Vec<_>>(),
        ),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Writes region reports in a single output format
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultWriter {
    format: OutputFormat,
}

impl ResultWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write every report to `path`, returning the number of rows written
    pub fn write(&self, reports: &[RegionReport], path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let rows = to_rows(reports);
        debug!(
            "Writing {} rows for {} regions to {} as {:?}",
            rows.len(),
            reports.len(),
            path.display(),
            self.format
        );

        match self.format {
            OutputFormat::Csv => {
                let mut df = to_dataframe(&rows)?;
                let mut file = File::create(path)?;
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut df)?;
            }
            OutputFormat::Parquet => {
                let mut df = to_dataframe(&rows)?;
                let file = File::create(path)?;
                ParquetWriter::new(file).finish(&mut df)?;
            }
            OutputFormat::Json => {
                let file = BufWriter::new(File::create(path)?);
                serde_json::to_writer_pretty(file, &rows)?;
            }
        }

        Ok(rows.len())
    }
}
