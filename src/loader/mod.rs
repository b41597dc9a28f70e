//! Station loading from a charging-station snapshot CSV
//!
//! Reads the snapshot, drops records the aggregator cannot use (missing
//! region, unusable coordinates, missing open date, not yet open), applies
//! manual region corrections and groups the surviving stations by region.

pub mod corrections;
pub mod fields;

#[cfg(test)]
pub mod tests;

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::models::{LoadStats, Station};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use self::corrections::apply_overrides;
use self::fields::{
    clean, optional_column, parse_coordinate, parse_date, read_string_frame, required_column,
};

/// One CSV row as raw text, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStationRecord {
    pub id: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub open_date: Option<String>,
    pub expected_date: Option<String>,
}

/// Stations grouped by region, with the counters from loading them
#[derive(Debug, Clone, Default)]
pub struct LoadedStations {
    pub regions: BTreeMap<String, Vec<Station>>,
    pub stats: LoadStats,
}

impl LoadedStations {
    /// Stations of a single region
    pub fn region(&self, code: &str) -> Option<&[Station]> {
        self.regions.get(code).map(Vec::as_slice)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn station_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

/// Why a raw record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingRegion,
    BadCoordinates,
    BadOpenDate,
    NotYetOpen,
}

/// Loads and cleans station records according to a [`LoaderConfig`]
#[derive(Debug, Clone)]
pub struct StationLoader {
    config: LoaderConfig,
}

impl StationLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load every usable station from a CSV file
    pub fn load(&self, path: &Path) -> Result<LoadedStations> {
        let start = Instant::now();
        let df = read_string_frame(path)?;
        let columns = &self.config.columns;

        let regions = required_column(&df, &columns.region, path)?;
        let latitudes = required_column(&df, &columns.latitude, path)?;
        let longitudes = required_column(&df, &columns.longitude, path)?;
        let open_dates = required_column(&df, &columns.open_date, path)?;
        let ids = match &columns.id {
            Some(name) => optional_column(&df, name)?,
            None => None,
        };
        let expected_dates = match &columns.expected_date {
            Some(name) => optional_column(&df, name)?,
            None => None,
        };

        debug!(
            "Read {} rows from {} (id column: {}, expected date column: {})",
            df.height(),
            path.display(),
            ids.is_some(),
            expected_dates.is_some()
        );

        let records = (0..df.height()).map(|row| RawStationRecord {
            id: ids.as_ref().and_then(|values| values[row].clone()),
            region: regions[row].clone(),
            latitude: latitudes[row].clone(),
            longitude: longitudes[row].clone(),
            open_date: open_dates[row].clone(),
            expected_date: expected_dates
                .as_ref()
                .and_then(|values| values[row].clone()),
        });

        let loaded = self.load_records(records);

        info!(
            "Loaded {} stations in {} regions from {} rows ({:.1}% kept) in {}ms",
            loaded.stats.stations_kept,
            loaded.region_count(),
            loaded.stats.rows_read,
            loaded.stats.keep_rate(),
            start.elapsed().as_millis()
        );

        Ok(loaded)
    }

    /// Validate, correct and group already-read records
    pub fn load_records(
        &self,
        records: impl IntoIterator<Item = RawStationRecord>,
    ) -> LoadedStations {
        let reference_date = self.config.effective_reference_date();
        let mut loaded = LoadedStations::default();

        for (index, record) in records.into_iter().enumerate() {
            loaded.stats.rows_read += 1;

            let mut station = match self.to_station(index + 1, &record, reference_date) {
                Ok(station) => station,
                Err(rejection) => {
                    match rejection {
                        Rejection::MissingRegion => loaded.stats.dropped_missing_region += 1,
                        Rejection::BadCoordinates => loaded.stats.dropped_bad_coordinates += 1,
                        Rejection::BadOpenDate => loaded.stats.dropped_bad_open_date += 1,
                        Rejection::NotYetOpen => loaded.stats.dropped_not_yet_open += 1,
                    }
                    continue;
                }
            };

            if apply_overrides(&mut station, &self.config.overrides) {
                loaded.stats.region_overrides_applied += 1;
            }

            if !self.region_selected(&station.region) {
                loaded.stats.dropped_region_filter += 1;
                continue;
            }

            loaded.stats.stations_kept += 1;
            loaded
                .regions
                .entry(station.region.clone())
                .or_default()
                .push(station);
        }

        if loaded.stats.total_dropped() > 0 {
            warn!(
                "Dropped {} of {} rows (region: {}, coordinates: {}, open date: {}, not yet open: {}, filtered: {})",
                loaded.stats.total_dropped(),
                loaded.stats.rows_read,
                loaded.stats.dropped_missing_region,
                loaded.stats.dropped_bad_coordinates,
                loaded.stats.dropped_bad_open_date,
                loaded.stats.dropped_not_yet_open,
                loaded.stats.dropped_region_filter
            );
        }

        loaded
    }

    fn to_station(
        &self,
        row_number: usize,
        record: &RawStationRecord,
        reference_date: NaiveDate,
    ) -> std::result::Result<Station, Rejection> {
        let region = clean(record.region.as_deref()).ok_or(Rejection::MissingRegion)?;

        let latitude =
            parse_coordinate(record.latitude.as_deref()).ok_or(Rejection::BadCoordinates)?;
        let longitude =
            parse_coordinate(record.longitude.as_deref()).ok_or(Rejection::BadCoordinates)?;

        // Planned stations carry an expected date and usually no open date
        if parse_date(record.expected_date.as_deref()).is_some_and(|date| date > reference_date) {
            return Err(Rejection::NotYetOpen);
        }

        let open_date = parse_date(record.open_date.as_deref()).ok_or(Rejection::BadOpenDate)?;
        if open_date > reference_date {
            return Err(Rejection::NotYetOpen);
        }

        let id = clean(record.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("row-{}", row_number));

        Station::new(id, region, latitude, longitude, open_date.year())
            .map_err(|_| Rejection::BadCoordinates)
    }

    fn region_selected(&self, region: &str) -> bool {
        self.config.regions.is_empty()
            || self
                .config
                .regions
                .iter()
                .any(|selected| selected.eq_ignore_ascii_case(region))
    }
}
