//! Behavior policies, the reactive decision core.
//!
//! A policy maps the sector minima and the temporal snapshot of one control tick, plus its own
//! explicit [NavigationPolicy::State], to exactly one velocity [Command]. Policies never read
//! the clock and never touch the tracker: the time of the tick is part of the input and tracker
//! mutations are requested through [TrackerEffects].

use std::fmt::{Debug, Display};

use crate::config::NavConfig;
use crate::sensing::SectorMinima;
use crate::tracking::{TemporalSnapshot, TrackerEffects};

/// Undirected in-place rotation with a half turn stop condition.
pub mod random_walk;
pub use random_walk::{RandomWalk, RandomWalkProp, RandomWalkState};

/// Right hand wall following with rotate-scan and optional stall recovery.
pub mod wall_follow;
pub use wall_follow::{WallFollow, WallFollowProp, WallFollowState};

/// Velocity command, sent atomically to the actuator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Command {
    /// Forward velocity in m/s.
    pub linear: f64,
    /// Counter-clockwise turn rate in rad/s.
    pub angular: f64,
}

impl Command {
    /// Explicit stop.
    pub const STOP: Command = Command {
        linear: 0.0,
        angular: 0.0,
    };

    /// Create a command.
    pub const fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// True if both velocities are zero.
    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "linear: {:.3}, angular: {:.3}", self.linear, self.angular)
    }
}

/// The branch of a state machine which fired in a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Random walk: spinning in place.
    Rotating,
    /// Random walk: half turn completed, holding still.
    Idle,
    /// Random walk: trial distance reached.
    TrialComplete,
    /// Wall follow: backing off after a stall.
    StallReverse,
    /// Wall follow: turning toward open space after backing off.
    RecoveryRotate,
    /// Wall follow: obstacle ahead, slow down and turn.
    AvoidFront,
    /// Wall follow: stop and spin away from the wall, looking for tags.
    ScanRotateAway,
    /// Wall follow: stop and spin toward the wall, looking for tags.
    ScanRotateToward,
    /// Wall follow: too close to the wall, veer left.
    WallTooClose,
    /// Wall follow: too far from the wall, veer right.
    WallTooFar,
    /// Wall follow: distance to the wall is fine, cruise straight.
    WallFollow,
}

impl Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Behavior::Rotating => "Rotating in place",
            Behavior::Idle => "Half turn completed, holding",
            Behavior::TrialComplete => "Trial distance reached",
            Behavior::StallReverse => "Stalled, recovering",
            Behavior::RecoveryRotate => "Rotating to find a new path",
            Behavior::AvoidFront => "Turning to avoid front obstacle",
            Behavior::ScanRotateAway | Behavior::ScanRotateToward => "Looking for tags",
            Behavior::WallTooClose => "Too close to wall, adjusting left",
            Behavior::WallTooFar => "Too far from wall, adjusting right",
            Behavior::WallFollow => "Following wall",
        };
        f.write_str(description)
    }
}

/// Everything a policy sees in one control tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlInput {
    /// Nearest obstacle per sector.
    pub sectors: SectorMinima,
    /// Temporal state at the tick.
    pub temporal: TemporalSnapshot,
}

impl ControlInput {
    /// Time of the tick.
    pub fn now(&self) -> f64 {
        self.temporal.now
    }
}

/// Outcome of one control tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    /// The branch which fired.
    pub behavior: Behavior,
    /// The command to send.
    pub command: Command,
    /// Whether the robot is considered moving after this tick.
    pub moving: bool,
    /// Tracker mutations to apply after the decision.
    pub effects: TrackerEffects,
}

impl Decision {
    /// Decision without tracker effects.
    pub fn new(behavior: Behavior, command: Command, moving: bool) -> Self {
        Self {
            behavior,
            command,
            moving,
            effects: TrackerEffects::default(),
        }
    }

    /// Attach tracker effects.
    pub fn with_effects(mut self, effects: TrackerEffects) -> Self {
        self.effects = effects;
        self
    }
}

/// A behavior strategy driving the robot from sector minima and temporal state.
///
/// Implementations are stateless apart from their immutable properties; all state that
/// persists across ticks lives in [NavigationPolicy::State], which is owned by the caller.
pub trait NavigationPolicy: Send + Sync + 'static {
    /// Flags and timers the policy carries across ticks.
    type State: Clone + Debug + Send + Sync + 'static;

    /// Human readable policy name.
    fn name(&self) -> &'static str;

    /// State at start-up; `now` is the time the controller is created.
    fn initial_state(&self, now: f64) -> Self::State;

    /// Decide on the command for one tick. Exactly one branch fires per call.
    ///
    /// `config` holds the tunables shared with the sensing substrate; the controller passes its
    /// own, so the thresholds a policy compares against always match the sector windows.
    fn compute_command(
        &self,
        config: &NavConfig,
        state: &mut Self::State,
        input: &ControlInput,
    ) -> Decision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_command() {
        assert!(Command::STOP.is_stop());
        assert!(!Command::new(0.0, 0.1).is_stop());
        assert_eq!(Command::default(), Command::STOP);
    }

    #[test]
    fn behaviors_describe_themselves() {
        assert_eq!(
            Behavior::AvoidFront.to_string(),
            "Turning to avoid front obstacle"
        );
        assert_eq!(Behavior::ScanRotateToward.to_string(), "Looking for tags");
    }
}
