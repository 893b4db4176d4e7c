use std::fmt::Display;
use std::ops::Range;

use crate::config::{INF_SENTINEL, NAN_SENTINEL};

/// Optional angular metadata of a range scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanGeometry {
    /// Bearing of the first reading in radians.
    pub angle_min: f64,
    /// Angular step between consecutive readings in radians.
    pub angle_increment: f64,
    /// Minimum valid range in meters.
    pub range_min: f64,
    /// Maximum valid range in meters.
    pub range_max: f64,
}

/// A raw range scan as delivered by the transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaserScan {
    /// Distances in meters, one per angular index. May contain `+Inf` and `NaN`.
    pub ranges: Vec<f64>,
    /// Angular metadata, if the sensor provides it.
    pub geometry: Option<ScanGeometry>,
}

impl LaserScan {
    /// Scan without angular metadata.
    pub fn from_ranges(ranges: Vec<f64>) -> Self {
        Self {
            ranges,
            geometry: None,
        }
    }
}

/// Replaces a single invalid reading by its sentinel.
///
/// `+Inf` (nothing within range) becomes [INF_SENTINEL], `NaN` becomes [NAN_SENTINEL].
/// `-Inf` is treated like `NaN`. All finite readings pass through unchanged.
pub fn clean_reading(reading: f64) -> f64 {
    if reading == f64::INFINITY {
        INF_SENTINEL
    } else if !reading.is_finite() {
        NAN_SENTINEL
    } else {
        reading
    }
}

/// Cleans a raw scan. Pure and total.
pub fn clean(raw: &[f64]) -> CleanedScan {
    CleanedScan {
        ranges: raw.iter().copied().map(clean_reading).collect(),
    }
}

/// A scan without non-finite members. Index is the angular bearing in degrees.
///
/// A cleaned scan is only ever replaced as a whole when a new raw scan arrives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanedScan {
    ranges: Vec<f64>,
}

impl CleanedScan {
    /// Number of readings.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if no scan has been received yet (or the scan was empty).
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All readings.
    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }

    /// Readings in `window`, clamped to the scan length.
    pub fn window(&self, window: Range<usize>) -> &[f64] {
        let end = window.end.min(self.ranges.len());
        let start = window.start.min(end);
        &self.ranges[start..end]
    }
}

impl From<&LaserScan> for CleanedScan {
    fn from(scan: &LaserScan) -> Self {
        clean(&scan.ranges)
    }
}

impl Display for CleanedScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let min = self.ranges.iter().copied().fold(f64::INFINITY, f64::min);
        write!(f, "{} readings, closest: {}", self.ranges.len(), min)
    }
}
