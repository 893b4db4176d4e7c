//! Named tuning constants and the [NavConfig] property bundle.

use crate::error::{NavError, Result};
use crate::sensing::SectorBounds;

/// Cruise velocity in m/s.
pub const LINEAR_VEL: f64 = 0.22;
/// Absolute stopping distance to an obstacle in meters.
pub const STOP_DISTANCE: f64 = 0.2;
/// Expected range error of the lidar in meters.
pub const LIDAR_ERROR: f64 = 0.05;
/// Front distance below which the robot starts avoiding, in meters.
pub const LIDAR_AVOID_DISTANCE: f64 = 0.7;
/// Stop margin including the lidar error.
pub const SAFE_STOP_DISTANCE: f64 = STOP_DISTANCE + LIDAR_ERROR;

/// First scan index of the left sector.
pub const LEFT_SIDE_INDEX: usize = 90;
/// End of the left sector, start of the front sector.
pub const LEFT_FRONT_INDEX: usize = 150;
/// End of the front sector, start of the right sector.
pub const RIGHT_FRONT_INDEX: usize = 210;
/// End (exclusive) of the right sector.
pub const RIGHT_SIDE_INDEX: usize = 270;

/// Seconds without motion before the robot counts as stalled.
pub const STALL_TIME_THRESHOLD: f64 = 5.0;
/// Period of the control tick in seconds.
pub const CONTROL_PERIOD: f64 = 0.5;
/// Per axis displacement below which two pose samples count as "not moved".
pub const MOTION_EPSILON: f64 = 0.00125;

/// Replacement for `+Inf` range readings (beyond sensor range).
pub const INF_SENTINEL: f64 = 3.5;
/// Replacement for `NaN` range readings.
pub const NAN_SENTINEL: f64 = 0.0;

/// Tunables shared by the sensing substrate and both behavior policies.
#[derive(Clone, Debug, PartialEq)]
pub struct NavConfig {
    /// Cruise velocity in m/s.
    pub linear_vel: f64,
    /// Absolute stopping distance in meters.
    pub stop_distance: f64,
    /// Lidar range error in meters.
    pub lidar_error: f64,
    /// Front avoidance distance in meters.
    pub lidar_avoid_distance: f64,
    /// Scan index windows of the left, front and right sectors.
    pub sectors: SectorBounds,
    /// Seconds without motion before a stall is declared.
    pub stall_time_threshold: f64,
    /// Control tick period in seconds.
    pub control_period: f64,
    /// Per axis motion threshold of the stall detector.
    pub motion_epsilon: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            linear_vel: LINEAR_VEL,
            stop_distance: STOP_DISTANCE,
            lidar_error: LIDAR_ERROR,
            lidar_avoid_distance: LIDAR_AVOID_DISTANCE,
            sectors: SectorBounds::default(),
            stall_time_threshold: STALL_TIME_THRESHOLD,
            control_period: CONTROL_PERIOD,
            motion_epsilon: MOTION_EPSILON,
        }
    }
}

impl NavConfig {
    /// Stop distance plus lidar error.
    pub fn safe_stop_distance(&self) -> f64 {
        self.stop_distance + self.lidar_error
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        self.sectors.validate()?;
        if !(self.control_period > 0.0 && self.control_period.is_finite()) {
            return Err(NavError::InvalidConfig(format!(
                "control period must be positive and finite, got {}",
                self.control_period
            )));
        }
        let distances = [
            ("linear_vel", self.linear_vel),
            ("stop_distance", self.stop_distance),
            ("lidar_error", self.lidar_error),
            ("lidar_avoid_distance", self.lidar_avoid_distance),
            ("stall_time_threshold", self.stall_time_threshold),
            ("motion_epsilon", self.motion_epsilon),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(NavError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
