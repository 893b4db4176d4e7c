use nalgebra::Vector3;

/// Stall timer fed by successive pose samples.
///
/// While two consecutive samples differ by less than `epsilon` on both the x and y axis, the
/// stationary time rises as `now - last_move_time`. Any larger displacement resets it to zero
/// and moves `last_move_time` to `now`.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionMonitor {
    epsilon: f64,
    saved_position: Option<Vector3<f64>>,
    last_move_time: f64,
    time_stationary: f64,
}

impl MotionMonitor {
    /// Create a monitor; the robot is assumed to have last moved at `now`.
    pub fn new(epsilon: f64, now: f64) -> Self {
        Self {
            epsilon,
            saved_position: None,
            last_move_time: now,
            time_stationary: 0.0,
        }
    }

    /// Process a position sample.
    pub fn observe(&mut self, position: &Vector3<f64>, now: f64) {
        if let Some(saved) = &self.saved_position {
            let dx = (saved.x - position.x).abs();
            let dy = (saved.y - position.y).abs();
            if dx < self.epsilon && dy < self.epsilon {
                self.time_stationary = now - self.last_move_time;
            } else {
                self.time_stationary = 0.0;
                self.last_move_time = now;
            }
        }
        self.saved_position = Some(*position);
    }

    /// Restart the stall timer as if the robot just moved.
    pub fn reset(&mut self, now: f64) {
        self.time_stationary = 0.0;
        self.last_move_time = now;
    }

    /// Raise the stationary time to at least `duration`.
    pub fn force_stationary(&mut self, duration: f64) {
        self.time_stationary = self.time_stationary.max(duration);
    }

    /// Seconds the robot has been still.
    pub fn time_stationary(&self) -> f64 {
        self.time_stationary
    }

    /// Time of the last detected motion.
    pub fn last_move_time(&self) -> f64 {
        self.last_move_time
    }
}

/// Properties of the [StallWatchdog].
#[derive(Clone, Debug, PartialEq)]
pub struct WatchdogProp {
    /// Seconds between two checkpoints.
    pub period: f64,
    /// Per axis displacement below which the robot counts as stuck between checkpoints.
    pub tolerance: f64,
}

impl Default for WatchdogProp {
    fn default() -> Self {
        Self {
            period: 60.0,
            tolerance: 0.01,
        }
    }
}

/// Coarse stall detector comparing positions a whole period apart.
///
/// Catches a robot jittering in place, which keeps resetting the fine grained
/// [MotionMonitor].
#[derive(Clone, Debug, PartialEq)]
pub struct StallWatchdog {
    prop: WatchdogProp,
    armed_at: f64,
    checkpoint: Option<Vector3<f64>>,
}

impl StallWatchdog {
    /// Create a watchdog armed at `now`.
    pub fn new(prop: WatchdogProp, now: f64) -> Self {
        Self {
            prop,
            armed_at: now,
            checkpoint: None,
        }
    }

    /// Process a position sample. Returns true if the robot is stuck.
    pub fn observe(&mut self, position: &Vector3<f64>, now: f64) -> bool {
        if now - self.armed_at < self.prop.period {
            return false;
        }
        let stuck = self.checkpoint.is_some_and(|checkpoint| {
            (checkpoint.x - position.x).abs() < self.prop.tolerance
                && (checkpoint.y - position.y).abs() < self.prop.tolerance
        });
        self.checkpoint = Some(*position);
        self.armed_at = now;
        stuck
    }

    /// Start a new period at `now`.
    pub fn rearm(&mut self, now: f64) {
        self.armed_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stationary_time_rises_while_still() {
        let mut monitor = MotionMonitor::new(0.00125, 0.0);
        let p = Vector3::new(1.0, 1.0, 0.0);
        for step in 0..=20 {
            let now = step as f64 * 0.25;
            let jitter = if step % 2 == 0 { 0.001 } else { -0.0001 };
            monitor.observe(&(p + Vector3::new(jitter, jitter, 0.0)), now);
        }
        assert_relative_eq!(monitor.time_stationary(), 5.0);
        assert_eq!(monitor.last_move_time(), 0.0);
    }

    #[test]
    fn motion_resets_the_timer() {
        let mut monitor = MotionMonitor::new(0.00125, 0.0);
        monitor.observe(&Vector3::zeros(), 0.0);
        monitor.observe(&Vector3::zeros(), 3.0);
        assert_relative_eq!(monitor.time_stationary(), 3.0);

        monitor.observe(&Vector3::new(0.01, 0.0, 0.0), 3.5);
        assert_eq!(monitor.time_stationary(), 0.0);
        assert_eq!(monitor.last_move_time(), 3.5);
    }

    #[test]
    fn first_sample_only_saves() {
        let mut monitor = MotionMonitor::new(0.00125, 0.0);
        monitor.observe(&Vector3::zeros(), 10.0);
        assert_eq!(monitor.time_stationary(), 0.0);
    }

    #[test]
    fn displacement_on_one_axis_counts_as_motion() {
        let mut monitor = MotionMonitor::new(0.00125, 0.0);
        monitor.observe(&Vector3::zeros(), 0.0);
        monitor.observe(&Vector3::new(0.0, 0.002, 0.0), 1.0);
        assert_eq!(monitor.time_stationary(), 0.0);
    }

    #[test]
    fn watchdog_trips_between_checkpoints() {
        let mut watchdog = StallWatchdog::new(WatchdogProp::default(), 0.0);
        let p = Vector3::new(2.0, 0.0, 0.0);
        assert!(!watchdog.observe(&p, 30.0));
        // first checkpoint
        assert!(!watchdog.observe(&p, 60.0));
        assert!(!watchdog.observe(&p, 90.0));
        assert!(watchdog.observe(&(p + Vector3::new(0.005, 0.0, 0.0)), 120.0));
        assert!(!watchdog.observe(&(p + Vector3::new(1.0, 0.0, 0.0)), 180.0));
    }
}
