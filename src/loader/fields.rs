//! Field parsing utilities for station CSV records
//!
//! Every input column is read as text; these helpers turn the raw cells into
//! typed values, treating blank and placeholder cells as missing.

use crate::constants::{DATE_FORMATS, DATETIME_FORMATS, MISSING_VALUE_TOKENS};
use crate::error::{Result, SpreadError};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;

/// Trimmed cell contents, or `None` for blank and placeholder cells
pub fn clean(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|value| !MISSING_VALUE_TOKENS.contains(value))
}

/// Parse a coordinate in decimal degrees
pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    clean(raw)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Parse a date in any of the accepted date or datetime formats
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let value = clean(raw)?;

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Read a CSV file with every column typed as a string
pub(crate) fn read_string_frame(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(SpreadError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

/// Values of a column as optional strings, `None` if the column is absent
pub(crate) fn optional_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };

    let as_strings = column.cast(&DataType::String)?;
    let values = as_strings
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();

    Ok(Some(values))
}

/// Values of a column that must be present in the file
pub(crate) fn required_column(
    df: &DataFrame,
    name: &str,
    path: &Path,
) -> Result<Vec<Option<String>>> {
    optional_column(df, name)?.ok_or_else(|| SpreadError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}
