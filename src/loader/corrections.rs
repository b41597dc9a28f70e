//! Manual region corrections for misfiled stations

use crate::config::RegionOverride;
use crate::models::Station;
use tracing::debug;

impl RegionOverride {
    /// Whether this correction applies to `station`
    pub fn matches(&self, station: &Station) -> bool {
        if (station.latitude - self.latitude).abs() > self.tolerance_degrees
            || (station.longitude - self.longitude).abs() > self.tolerance_degrees
        {
            return false;
        }

        if self.open_year.is_some_and(|year| year != station.open_year) {
            return false;
        }

        self.from_region
            .as_deref()
            .is_none_or(|region| region.eq_ignore_ascii_case(&station.region))
    }
}

/// Reassign `station` using the first matching override; true when moved
pub fn apply_overrides(station: &mut Station, overrides: &[RegionOverride]) -> bool {
    let Some(correction) = overrides.iter().find(|o| o.matches(station)) else {
        return false;
    };

    if correction.to_region == station.region {
        return false;
    }

    debug!(
        "Moving station {} from {} to {}",
        station.id, station.region, correction.to_region
    );
    station.region = correction.to_region.clone();
    true
}
