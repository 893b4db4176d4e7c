use std::fmt::Display;
use std::ops::Range;

use crate::config::{LEFT_FRONT_INDEX, LEFT_SIDE_INDEX, RIGHT_FRONT_INDEX, RIGHT_SIDE_INDEX};
use crate::error::{NavError, Result};
use crate::sensing::CleanedScan;

/// Index boundaries of the three sectors.
///
/// ```text
/// left:  [left_side, left_front)
/// front: [left_front, right_front)
/// right: [right_front, right_side)
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectorBounds {
    /// Start of the left sector.
    pub left_side: usize,
    /// End of the left sector and start of the front sector.
    pub left_front: usize,
    /// End of the front sector and start of the right sector.
    pub right_front: usize,
    /// End of the right sector.
    pub right_side: usize,
}

impl Default for SectorBounds {
    fn default() -> Self {
        Self {
            left_side: LEFT_SIDE_INDEX,
            left_front: LEFT_FRONT_INDEX,
            right_front: RIGHT_FRONT_INDEX,
            right_side: RIGHT_SIDE_INDEX,
        }
    }
}

impl SectorBounds {
    /// Index window of the left sector.
    pub fn left(&self) -> Range<usize> {
        self.left_side..self.left_front
    }

    /// Index window of the front sector.
    pub fn front(&self) -> Range<usize> {
        self.left_front..self.right_front
    }

    /// Index window of the right sector.
    pub fn right(&self) -> Range<usize> {
        self.right_front..self.right_side
    }

    /// Bounds must be strictly increasing so that no window is empty.
    pub fn validate(&self) -> Result<()> {
        if self.left_side < self.left_front
            && self.left_front < self.right_front
            && self.right_front < self.right_side
        {
            Ok(())
        } else {
            Err(NavError::InvalidConfig(format!(
                "sector bounds must be strictly increasing, got {self:?}"
            )))
        }
    }
}

/// Nearest obstacle distance per sector, recomputed every control cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorMinima {
    /// Minimum of the left sector.
    pub left: f64,
    /// Minimum of the right sector.
    pub right: f64,
    /// Minimum of the front sector.
    pub front: f64,
}

impl Display for SectorMinima {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "left: {:.3}, front: {:.3}, right: {:.3}",
            self.left, self.front, self.right
        )
    }
}

fn window_min(window: &[f64]) -> Option<f64> {
    window.iter().copied().reduce(f64::min)
}

/// Reduces a cleaned scan to its sector minima.
///
/// Returns `None` while there is no data, i.e. if the scan is empty or too short to populate
/// every sector.
pub fn aggregate(scan: &CleanedScan, bounds: &SectorBounds) -> Option<SectorMinima> {
    Some(SectorMinima {
        left: window_min(scan.window(bounds.left()))?,
        right: window_min(scan.window(bounds.right()))?,
        front: window_min(scan.window(bounds.front()))?,
    })
}
