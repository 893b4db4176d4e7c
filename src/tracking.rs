//! Temporal state carried across control cycles.
//!
//! The [TemporalStateTracker] owns the latest pose and derives timers, yaw and distance
//! bookkeeping from successive pose samples. Once per tick the controller reads an immutable
//! [TemporalSnapshot] from it and hands that to the behavior policy.

use nalgebra::Vector3;

use crate::config::{MOTION_EPSILON, STALL_TIME_THRESHOLD};
use crate::sensing::Pose;

/// Stall timer and coarse stall watchdog.
pub mod motion;
pub use motion::{MotionMonitor, StallWatchdog, WatchdogProp};

/// Yaw origin and yaw differences.
pub mod heading;
pub use heading::{normalize_angle, yaw_difference, HeadingTracker};

/// Per tick distance accumulation.
pub mod odometer;
pub use odometer::Odometer;

/// Properties of the temporal state tracker.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerProp {
    /// Per axis displacement below which the robot counts as still.
    pub motion_epsilon: f64,
    /// Stall threshold the watchdog raises the stationary time to.
    pub stall_time_threshold: f64,
    /// Coarse stall watchdog; disabled if `None`.
    pub watchdog: Option<WatchdogProp>,
}

impl Default for TrackerProp {
    fn default() -> Self {
        Self {
            motion_epsilon: MOTION_EPSILON,
            stall_time_threshold: STALL_TIME_THRESHOLD,
            watchdog: None,
        }
    }
}

/// Tracker mutations requested by a policy decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerEffects {
    /// Add the distance since the last saved position to the running total.
    pub accumulate_distance: bool,
    /// Restart the stall timer.
    pub reset_stall_timer: bool,
    /// Clear the running distance total.
    pub reset_trial: bool,
    /// Start a new watchdog period.
    pub rearm_watchdog: bool,
}

/// Read-only view of the temporal state at one control tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalSnapshot {
    /// Time of the tick in seconds.
    pub now: f64,
    /// Latest pose.
    pub pose: Pose,
    /// Position of the very first pose sample.
    pub start_position: Vector3<f64>,
    /// Position saved by the last distance accumulation.
    pub last_saved_position: Vector3<f64>,
    /// Yaw of the first pose sample.
    pub start_yaw: f64,
    /// Yaw of the latest pose sample.
    pub current_yaw: f64,
    /// Seconds the robot has been still.
    pub time_stationary: f64,
    /// Time of the last detected motion.
    pub last_move_time: f64,
    /// Distance accumulated by the odometer.
    pub total_distance: f64,
}

impl TemporalSnapshot {
    /// Snapshot of a robot which has not moved since `now`, with a single pose sample.
    pub fn at_rest(pose: Pose, now: f64) -> Self {
        let yaw = pose.yaw();
        Self {
            now,
            start_position: pose.position,
            last_saved_position: pose.position,
            pose,
            start_yaw: yaw,
            current_yaw: yaw,
            time_stationary: 0.0,
            last_move_time: now,
            total_distance: 0.0,
        }
    }

    /// Yaw difference to the first sample, optionally wrapped to [-π, π].
    pub fn yaw_delta(&self, normalize: bool) -> f64 {
        yaw_difference(self.current_yaw, self.start_yaw, normalize)
    }
}

/// Owner of the pose and of all timers derived from it.
#[derive(Clone, Debug)]
pub struct TemporalStateTracker {
    prop: TrackerProp,
    pose: Option<Pose>,
    heading: HeadingTracker,
    motion: MotionMonitor,
    odometer: Odometer,
    watchdog: Option<StallWatchdog>,
}

impl TemporalStateTracker {
    /// Create a tracker; all timers start at `now`.
    pub fn new(prop: TrackerProp, now: f64) -> Self {
        Self {
            motion: MotionMonitor::new(prop.motion_epsilon, now),
            watchdog: prop
                .watchdog
                .clone()
                .map(|watchdog| StallWatchdog::new(watchdog, now)),
            prop,
            pose: None,
            heading: HeadingTracker::default(),
            odometer: Odometer::default(),
        }
    }

    /// Process an odometry sample.
    pub fn on_pose_sample(&mut self, pose: Pose, now: f64) {
        self.heading.observe(pose.yaw());
        self.odometer.observe(&pose.position);
        self.motion.observe(&pose.position, now);
        if let Some(watchdog) = &mut self.watchdog {
            if watchdog.observe(&pose.position, now) {
                tracing::warn!("no progress within a watchdog period, forcing stall");
                self.motion
                    .force_stationary(self.prop.stall_time_threshold + 1.0);
            }
        }
        self.pose = Some(pose);
    }

    /// Latest pose.
    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Snapshot for the tick at `now`, or `None` before the first pose sample.
    pub fn snapshot(&self, now: f64) -> Option<TemporalSnapshot> {
        let pose = self.pose.clone()?;
        Some(TemporalSnapshot {
            now,
            start_position: self.odometer.start().unwrap_or(pose.position),
            last_saved_position: self.odometer.last_saved().unwrap_or(pose.position),
            start_yaw: self.heading.start_yaw()?,
            current_yaw: self.heading.current_yaw()?,
            time_stationary: self.motion.time_stationary(),
            last_move_time: self.motion.last_move_time(),
            total_distance: self.odometer.total_distance(),
            pose,
        })
    }

    /// Apply the mutations requested by a decision taken at `now`.
    pub fn apply(&mut self, effects: &TrackerEffects, now: f64) {
        if effects.accumulate_distance {
            if let Some(pose) = &self.pose {
                self.odometer.accumulate(&pose.position);
            }
        }
        if effects.reset_trial {
            self.odometer.reset_trial();
        }
        if effects.reset_stall_timer {
            self.motion.reset(now);
        }
        if effects.rearm_watchdog {
            if let Some(watchdog) = &mut self.watchdog {
                watchdog.rearm(now);
            }
        }
    }

    /// Seconds the robot has been still.
    pub fn time_stationary(&self) -> f64 {
        self.motion.time_stationary()
    }

    /// Distance accumulated so far.
    pub fn total_distance(&self) -> f64 {
        self.odometer.total_distance()
    }
}
