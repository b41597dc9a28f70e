//! Incrementally growing pairwise distance accumulator
//!
//! The accumulator only ever grows across the year loop. In streaming mode it
//! keeps a count, running sum and running maximum; in retain mode it also
//! keeps every distance keyed by the year it was appended.

use std::collections::BTreeMap;

/// Running statistics over every pairwise distance seen so far
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    count: u64,
    sum: f64,
    max: Option<f64>,
    retained: Option<BTreeMap<i32, Vec<f64>>>,
}

impl DistanceAccumulator {
    /// Accumulator that keeps only running statistics
    pub fn streaming() -> Self {
        Self::default()
    }

    /// Accumulator that also retains every distance, keyed by year
    pub fn retaining() -> Self {
        Self {
            retained: Some(BTreeMap::new()),
            ..Self::default()
        }
    }

    /// Append one pairwise distance observed in `year`
    pub fn push(&mut self, year: i32, distance: f64) {
        self.count += 1;
        self.sum += distance;
        self.max = Some(match self.max {
            Some(current) if current >= distance => current,
            _ => distance,
        });

        if let Some(retained) = self.retained.as_mut() {
            retained.entry(year).or_default().push(distance);
        }
    }

    /// Make sure a retained entry exists for `year`, even if nothing is appended
    pub fn open_year(&mut self, year: i32) {
        if let Some(retained) = self.retained.as_mut() {
            retained.entry(year).or_default();
        }
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Arithmetic mean of all distances, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// Largest distance seen so far, `None` when empty
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Hand over the retained per-year distances, if any
    pub fn into_retained(self) -> Option<BTreeMap<i32, Vec<f64>>> {
        self.retained
    }
}

/// Number of unordered pairs among `stations` stations
pub fn estimate_pair_count(stations: usize) -> u64 {
    let n = stations as u64;
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// Bytes needed to retain every pairwise distance among `stations` stations
pub fn estimate_retained_bytes(stations: usize) -> u64 {
    estimate_pair_count(stations).saturating_mul(crate::constants::BYTES_PER_DISTANCE)
}
