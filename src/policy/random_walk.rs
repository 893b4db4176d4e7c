use tracing::{debug, info};

use crate::config::NavConfig;
use crate::policy::{Behavior, Command, ControlInput, Decision, NavigationPolicy};
use crate::tracking::TrackerEffects;

/// Properties of the random walk policy.
///
/// With the defaults the robot spins in place at 2.094 rad/s (120°/s) and stops for good once
/// the yaw differs by a half turn from the yaw of the first odometry sample. No obstacle
/// avoidance is active.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomWalkProp {
    /// Turn rate while rotating, in rad/s.
    pub angular_velocity: f64,
    /// Forward velocity while rotating, in m/s. Zero spins in place.
    pub linear_velocity: f64,
    /// Yaw difference at which the robot stops, in radians.
    pub yaw_limit: f64,
    /// Wrap the yaw difference to [-π, π] before comparing it to `yaw_limit`.
    ///
    /// Off by default: the raw difference jumps by almost 2π when the yaw crosses the ±π
    /// seam, which trips the limit early.
    pub normalize_yaw: bool,
    /// Distance along x after which a trial ends; disabled if `None`.
    pub trial_distance: Option<f64>,
}

impl Default for RandomWalkProp {
    fn default() -> Self {
        Self {
            angular_velocity: 2.094,
            linear_velocity: 0.0,
            yaw_limit: 3.14159,
            normalize_yaw: false,
            trial_distance: None,
        }
    }
}

/// State of the random walk policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RandomWalkState {
    /// True while the robot is spinning.
    pub rotating: bool,
    /// Number of ticks which ended a trial.
    pub trials_completed: u32,
}

/// Random walk policy.
#[derive(Clone, Debug, Default)]
pub struct RandomWalk {
    /// Properties.
    pub prop: RandomWalkProp,
}

impl RandomWalk {
    /// Policy with the given properties.
    pub fn new(prop: RandomWalkProp) -> Self {
        Self { prop }
    }
}

impl NavigationPolicy for RandomWalk {
    type State = RandomWalkState;

    fn name(&self) -> &'static str {
        "random walk"
    }

    fn initial_state(&self, _now: f64) -> RandomWalkState {
        RandomWalkState::default()
    }

    fn compute_command(
        &self,
        _config: &NavConfig,
        state: &mut RandomWalkState,
        input: &ControlInput,
    ) -> Decision {
        let temporal = &input.temporal;
        let yaw_diff = temporal.yaw_delta(self.prop.normalize_yaw);
        debug!("yaw difference: {} radians", yaw_diff);

        if yaw_diff.abs() >= self.prop.yaw_limit {
            state.rotating = false;
            return Decision::new(Behavior::Idle, Command::STOP, false);
        }

        if let Some(trial_distance) = self.prop.trial_distance {
            let estimated = temporal.pose.position.x - temporal.start_position.x;
            if estimated >= trial_distance {
                let actual = temporal.total_distance
                    + temporal.pose.planar_distance(&temporal.last_saved_position);
                info!("Estimated Distance: {}", estimated);
                info!("Actual Distance: {}", actual);
                state.rotating = false;
                state.trials_completed += 1;
                return Decision::new(Behavior::TrialComplete, Command::STOP, false).with_effects(
                    TrackerEffects {
                        accumulate_distance: true,
                        reset_trial: true,
                        ..Default::default()
                    },
                );
            }
        }

        state.rotating = true;
        Decision::new(
            Behavior::Rotating,
            Command::new(self.prop.linear_velocity, self.prop.angular_velocity),
            true,
        )
        .with_effects(TrackerEffects {
            accumulate_distance: true,
            ..Default::default()
        })
    }
}
