//! Shared test utilities and fixtures for station loader tests

use crate::config::LoaderConfig;
use crate::loader::{RawStationRecord, StationLoader};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};


/// Raw record with every field present and valid
pub fn raw_record(id: &str, region: &str, lat: &str, lon: &str, open: &str) -> RawStationRecord {
    RawStationRecord {
        id: Some(id.to_string()),
        region: Some(region.to_string()),
        latitude: Some(lat.to_string()),
        longitude: Some(lon.to_string()),
        open_date: Some(open.to_string()),
        expected_date: None,
    }
}

/// Loader pinned to a fixed reference date so results never depend on today
pub fn loader_as_of(year: i32, month: u32, day: u32) -> StationLoader {
    StationLoader::new(LoaderConfig {
        reference_date: NaiveDate::from_ymd_opt(year, month, day),
        ..Default::default()
    })
}

/// Write an AFDC-style station snapshot with the given data rows
pub fn write_station_csv(dir: &Path, filename: &str, rows: &[&str]) -> PathBuf {
    let mut content = String::from("ID,Station Name,State,Latitude,Longitude,Open Date,Expected Date\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }

    let path = dir.join(filename);
    fs::write(&path, content).unwrap();
    path
}
