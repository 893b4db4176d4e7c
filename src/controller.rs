//! Per tick orchestration of the control core.
//!
//! Sensor callbacks only replace cached state ([NavController::on_scan],
//! [NavController::on_pose]). The periodic tick ([NavController::tick]) reads one consistent
//! snapshot, lets the policy decide, applies the requested tracker effects and returns the
//! command to publish. The one [NavConfig] of the controller drives the sector windows, the
//! tracker, the policy thresholds and the control period of the navigator.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::NavConfig;
use crate::error::Result;
use crate::policy::{Command, ControlInput, Decision, NavigationPolicy};
use crate::sensing::{aggregate, CleanedScan, LaserScan, Pose};
use crate::tracking::{TemporalStateTracker, TrackerProp};

/// The reactive navigation controller.
pub struct NavController<P: NavigationPolicy, C: Clock> {
    config: NavConfig,
    policy: P,
    state: P::State,
    tracker: TemporalStateTracker,
    scan: CleanedScan,
    clock: C,
    moving: bool,
    last_decision: Option<Decision>,
}

impl<P: NavigationPolicy, C: Clock> NavController<P, C> {
    /// Create a controller. Timers and policy state start at the current clock time.
    ///
    /// Fails with [NavError::InvalidConfig](crate::error::NavError::InvalidConfig) if `config`
    /// does not validate.
    pub fn new(config: NavConfig, tracker_prop: TrackerProp, policy: P, clock: C) -> Result<Self> {
        config.validate()?;
        let now = clock.now();
        Ok(Self {
            state: policy.initial_state(now),
            tracker: TemporalStateTracker::new(tracker_prop, now),
            config,
            policy,
            scan: CleanedScan::default(),
            clock,
            moving: false,
            last_decision: None,
        })
    }

    /// Create a controller whose tracker follows `config`.
    pub fn with_config(config: NavConfig, policy: P, clock: C) -> Result<Self> {
        let tracker_prop = TrackerProp {
            motion_epsilon: config.motion_epsilon,
            stall_time_threshold: config.stall_time_threshold,
            ..Default::default()
        };
        Self::new(config, tracker_prop, policy, clock)
    }

    /// Scan callback: replaces the cached scan as a whole.
    pub fn on_scan(&mut self, scan: &LaserScan) {
        self.scan = CleanedScan::from(scan);
    }

    /// Odometry callback: updates the temporal state.
    pub fn on_pose(&mut self, pose: Pose) {
        let now = self.clock.now();
        self.tracker.on_pose_sample(pose, now);
    }

    /// One control cycle.
    ///
    /// Returns the command to publish, or `None` while scan or pose are missing. Withheld ticks
    /// mark the robot as not moving.
    pub fn tick(&mut self) -> Option<Command> {
        let now = self.clock.now();
        let Some(input) = self.control_input(now) else {
            debug!("no sensor data yet, withholding command");
            self.moving = false;
            return None;
        };

        let decision = self
            .policy
            .compute_command(&self.config, &mut self.state, &input);
        let changed = self
            .last_decision
            .as_ref()
            .map_or(true, |last| last.behavior != decision.behavior);
        if changed {
            info!("{} ({})", decision.behavior, decision.command);
        } else {
            debug!("{} ({})", decision.behavior, decision.command);
        }
        self.tracker.apply(&decision.effects, now);
        self.moving = decision.moving;
        let command = decision.command;
        self.last_decision = Some(decision);
        Some(command)
    }

    fn control_input(&self, now: f64) -> Option<ControlInput> {
        if self.scan.is_empty() {
            return None;
        }
        Some(ControlInput {
            sectors: aggregate(&self.scan, &self.config.sectors)?,
            temporal: self.tracker.snapshot(now)?,
        })
    }

    /// Whether the last tick left the robot moving.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// The policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The policy state after the last tick.
    pub fn policy_state(&self) -> &P::State {
        &self.state
    }

    /// Mutable policy state, e.g. to replay a recorded situation.
    pub fn policy_state_mut(&mut self) -> &mut P::State {
        &mut self.state
    }

    /// The temporal state tracker.
    pub fn tracker(&self) -> &TemporalStateTracker {
        &self.tracker
    }

    /// The cached scan.
    pub fn scan(&self) -> &CleanedScan {
        &self.scan
    }

    /// The decision of the last tick which produced a command.
    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    /// Configuration.
    pub fn config(&self) -> &NavConfig {
        &self.config
    }
}
