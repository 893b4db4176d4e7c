use tracing::info;

use crate::config::NavConfig;
use crate::policy::{Behavior, Command, ControlInput, Decision, NavigationPolicy};
use crate::tracking::TrackerEffects;

/// Properties of the wall follow policy.
///
/// All band edges are offsets on top of the safe stop distance of the controller's
/// [NavConfig] (`stop_distance + lidar_error`, 0.25 m by default). The edges are tuned so that the
/// "too close", "too far" and "cruise" bands do not chatter; change them together.
#[derive(Clone, Debug, PartialEq)]
pub struct WallFollowProp {
    /// Forward velocity while avoiding a front obstacle.
    pub avoid_linear: f64,
    /// Turn rate magnitude while avoiding a front obstacle.
    pub avoid_turn: f64,
    /// Right sector must exceed `safe + avoid_right_clear_margin` to avoid by turning right.
    pub avoid_right_clear_margin: f64,

    /// Seconds after arming before a rotate-scan toward the wall may start.
    pub scan_interval: f64,
    /// Seconds after arming at which the robot spins away from the wall.
    pub scan_away_after: f64,
    /// Seconds after arming at which the rotate-scan ends.
    pub scan_end_after: f64,
    /// Turn rate magnitude of the rotate-scan.
    pub scan_turn: f64,
    /// Right sector below `safe + scan_near_wall_margin` counts as "wall near" for the scan.
    pub scan_near_wall_margin: f64,

    /// Forward velocity while correcting the wall distance.
    pub adjust_linear: f64,
    /// Left turn rate when too close to the wall.
    pub too_close_turn: f64,
    /// Right turn rate magnitude when too far from the wall.
    pub too_far_turn: f64,
    /// Right sector above `safe + too_far_margin` is too far (after start-up).
    pub too_far_margin: f64,
    /// Right sector below `safe + start_search_margin` keeps veering right during start-up.
    pub start_search_margin: f64,

    /// Right sector above `safe + wall_lost_margin` for longer than `wall_lost_timeout`
    /// seconds clears the "wall found" flag.
    pub wall_lost_margin: f64,
    /// See `wall_lost_margin`.
    pub wall_lost_timeout: f64,

    /// Enables the stall reverse / recovery rotate branches.
    pub stall_recovery: bool,
    /// Reverse velocity magnitude after a stall.
    pub reverse_linear: f64,
    /// Turn rate magnitude of the recovery rotation.
    pub recovery_turn: f64,
}

impl Default for WallFollowProp {
    fn default() -> Self {
        Self {
            avoid_linear: 0.07,
            avoid_turn: 0.5,
            avoid_right_clear_margin: 0.3,
            scan_interval: 5.0,
            scan_away_after: 8.0,
            scan_end_after: 11.0,
            scan_turn: 1.0,
            scan_near_wall_margin: 0.5,
            adjust_linear: 0.10,
            too_close_turn: 0.1,
            too_far_turn: 0.18,
            too_far_margin: 0.2,
            start_search_margin: 0.5,
            wall_lost_margin: 0.35,
            wall_lost_timeout: 5.0,
            stall_recovery: false,
            reverse_linear: 0.5,
            recovery_turn: 0.8,
        }
    }
}

/// Flags and timers of the wall follow state machine.
#[derive(Clone, Debug, PartialEq)]
pub struct WallFollowState {
    /// A wall has been detected on the right recently.
    pub found_wall: bool,
    /// Rotate-scan mode is active.
    pub rotate: bool,
    /// Start-up phase, before the first wall or obstacle contact.
    pub start: bool,
    /// A stall reverse is pending.
    pub stall: bool,
    /// A recovery rotation is pending.
    pub recovery: bool,
    /// Time the rotate-scan timer was last armed.
    pub rotate_time: f64,
    /// Time a wall was last detected.
    pub time_last_wall: f64,
}

impl WallFollowState {
    /// Fresh state at start-up time `now`.
    pub fn new(now: f64) -> Self {
        Self {
            found_wall: false,
            rotate: false,
            start: true,
            stall: false,
            recovery: false,
            rotate_time: now,
            time_last_wall: 0.0,
        }
    }
}

/// Right hand wall follow policy.
///
/// Guards are evaluated in strict priority order, exactly one fires per tick:
///
/// 1. (stall recovery, if enabled) reverse / recovery rotate / stall detected
/// 2. obstacle ahead and not in rotate-scan mode: [Behavior::AvoidFront]
/// 3. rotate-scan active and at least 8 s since arming: [Behavior::ScanRotateAway], ending
///    the rotate-scan at 11 s
/// 4. at least 5 s since arming, wall near, start-up over: [Behavior::ScanRotateToward]
/// 5. otherwise keep the wall distance: [Behavior::WallTooClose], [Behavior::WallTooFar]
///    or [Behavior::WallFollow]
#[derive(Clone, Debug, Default)]
pub struct WallFollow {
    /// Properties.
    pub prop: WallFollowProp,
}

impl WallFollow {
    /// Policy with the given properties.
    pub fn new(prop: WallFollowProp) -> Self {
        Self { prop }
    }

    fn stall_recovery(
        &self,
        config: &NavConfig,
        state: &mut WallFollowState,
        input: &ControlInput,
    ) -> Option<Decision> {
        let prop = &self.prop;
        let now = input.now();
        if state.stall {
            state.stall = false;
            return Some(Decision::new(
                Behavior::StallReverse,
                Command::new(-prop.reverse_linear, 0.0),
                true,
            ));
        }
        if state.recovery {
            let angular = if input.sectors.right > input.sectors.left {
                -prop.recovery_turn
            } else {
                prop.recovery_turn
            };
            state.recovery = false;
            return Some(
                Decision::new(Behavior::RecoveryRotate, Command::new(0.0, angular), true)
                    .with_effects(TrackerEffects {
                        reset_stall_timer: true,
                        rearm_watchdog: true,
                        ..Default::default()
                    }),
            );
        }
        if input.temporal.time_stationary >= config.stall_time_threshold {
            info!(
                "stationary for {:.1}s at {:.1}s",
                input.temporal.time_stationary,
                now
            );
            state.stall = true;
            state.recovery = true;
            return Some(
                Decision::new(
                    Behavior::StallReverse,
                    Command::new(-prop.reverse_linear, 0.0),
                    true,
                )
                .with_effects(TrackerEffects {
                    reset_stall_timer: true,
                    ..Default::default()
                }),
            );
        }
        None
    }

    fn keep_wall_distance(
        &self,
        config: &NavConfig,
        state: &mut WallFollowState,
        input: &ControlInput,
    ) -> Decision {
        let prop = &self.prop;
        let safe = config.safe_stop_distance();
        let right = input.sectors.right;
        let now = input.now();

        if right < safe {
            state.start = false;
            state.found_wall = true;
            state.time_last_wall = now;
            Decision::new(
                Behavior::WallTooClose,
                Command::new(prop.adjust_linear, prop.too_close_turn),
                true,
            )
        } else if (right > safe + prop.too_far_margin && !state.start)
            || (right < safe + prop.start_search_margin && state.start)
        {
            Decision::new(
                Behavior::WallTooFar,
                Command::new(prop.adjust_linear, -prop.too_far_turn),
                true,
            )
        } else {
            state.found_wall = true;
            state.time_last_wall = now;
            Decision::new(
                Behavior::WallFollow,
                Command::new(config.linear_vel, 0.0),
                true,
            )
        }
    }
}

impl NavigationPolicy for WallFollow {
    type State = WallFollowState;

    fn name(&self) -> &'static str {
        "wall follow"
    }

    fn initial_state(&self, now: f64) -> WallFollowState {
        WallFollowState::new(now)
    }

    fn compute_command(
        &self,
        config: &NavConfig,
        state: &mut WallFollowState,
        input: &ControlInput,
    ) -> Decision {
        let prop = &self.prop;
        let safe = config.safe_stop_distance();
        let sectors = &input.sectors;
        let now = input.now();

        // wall lost timeout, independent of the branch which fires below
        if sectors.right > safe + prop.wall_lost_margin
            && now - state.time_last_wall > prop.wall_lost_timeout
        {
            state.found_wall = false;
        }

        if prop.stall_recovery {
            if let Some(decision) = self.stall_recovery(config, state, input) {
                return decision;
            }
        }

        if sectors.front < config.lidar_avoid_distance && !state.rotate {
            let angular = if sectors.right > safe + prop.avoid_right_clear_margin
                && state.found_wall
                && !state.start
            {
                // turn, but keep following the wall
                state.time_last_wall = now;
                -prop.avoid_turn
            } else {
                if state.start {
                    state.rotate_time = now;
                    state.found_wall = false;
                }
                state.start = false;
                prop.avoid_turn
            };
            Decision::new(
                Behavior::AvoidFront,
                Command::new(prop.avoid_linear, angular),
                true,
            )
        } else if state.rotate && now - state.rotate_time >= prop.scan_away_after {
            if now - state.rotate_time >= prop.scan_end_after {
                state.rotate = false;
                state.rotate_time = now;
            }
            Decision::new(
                Behavior::ScanRotateAway,
                Command::new(0.0, prop.scan_turn),
                true,
            )
        } else if now - state.rotate_time >= prop.scan_interval
            && (state.found_wall || sectors.right < safe + prop.scan_near_wall_margin)
            && !state.start
        {
            state.rotate = true;
            Decision::new(
                Behavior::ScanRotateToward,
                Command::new(0.0, -prop.scan_turn),
                true,
            )
        } else {
            self.keep_wall_distance(config, state, input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LINEAR_VEL;
    use crate::sensing::{Pose, SectorMinima};
    use crate::tracking::TemporalSnapshot;

    fn input(front: f64, right: f64, now: f64) -> ControlInput {
        ControlInput {
            sectors: SectorMinima {
                left: 3.5,
                right,
                front,
            },
            temporal: TemporalSnapshot::at_rest(Pose::default(), now),
        }
    }

    fn running_state(now: f64) -> WallFollowState {
        WallFollowState {
            start: false,
            ..WallFollowState::new(now)
        }
    }

    #[test]
    fn avoid_front_during_start_arms_the_scan_timer() {
        let config = NavConfig::default();
        let policy = WallFollow::default();
        let mut state = policy.initial_state(0.0);
        let decision = policy.compute_command(&config, &mut state, &input(0.5, 1.0, 2.0));
        assert_eq!(decision.behavior, Behavior::AvoidFront);
        assert_eq!(decision.command, Command::new(0.07, 0.5));
        assert!(!state.start);
        assert!(!state.found_wall);
        assert_eq!(state.rotate_time, 2.0);
    }

    #[test]
    fn avoid_front_follows_a_known_wall_to_the_right() {
        let config = NavConfig::default();
        let policy = WallFollow::default();
        let mut state = WallFollowState {
            found_wall: true,
            time_last_wall: 1.0,
            ..running_state(0.0)
        };
        let decision = policy.compute_command(&config, &mut state, &input(0.5, 0.6, 2.0));
        assert_eq!(decision.command, Command::new(0.07, -0.5));
        assert_eq!(state.time_last_wall, 2.0);
        assert_eq!(state.rotate_time, 0.0);
    }

    #[test]
    fn wall_distance_bands() {
        let config = NavConfig::default();
        let policy = WallFollow::default();

        let mut state = running_state(0.0);
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.15, 1.0));
        assert_eq!(decision.behavior, Behavior::WallTooClose);
        assert_eq!(decision.command, Command::new(0.10, 0.1));
        assert!(state.found_wall);

        let mut state = running_state(0.0);
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.50, 1.0));
        assert_eq!(decision.behavior, Behavior::WallTooFar);
        assert_eq!(decision.command, Command::new(0.10, -0.18));
        assert!(!state.found_wall);

        let mut state = running_state(0.0);
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 1.0));
        assert_eq!(decision.behavior, Behavior::WallFollow);
        assert_eq!(decision.command, Command::new(LINEAR_VEL, 0.0));
        assert!(state.found_wall);
        assert_eq!(state.time_last_wall, 1.0);
    }

    #[test]
    fn start_phase_searches_to_the_right() {
        let config = NavConfig::default();
        let policy = WallFollow::default();
        let mut state = policy.initial_state(0.0);
        // close-ish wall while starting: keep veering right
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.6, 1.0));
        assert_eq!(decision.behavior, Behavior::WallTooFar);
        // nothing near: cruise straight
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 3.0, 1.5));
        assert_eq!(decision.behavior, Behavior::WallFollow);
        assert!(state.start);
    }

    #[test]
    fn rotate_scan_cycle() {
        let config = NavConfig::default();
        let policy = WallFollow::default();
        let mut state = WallFollowState {
            found_wall: true,
            time_last_wall: 4.5,
            ..running_state(0.0)
        };

        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 4.5));
        assert_eq!(decision.behavior, Behavior::WallFollow);

        // 5 s after arming
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 5.0));
        assert_eq!(decision.behavior, Behavior::ScanRotateToward);
        assert_eq!(decision.command, Command::new(0.0, -1.0));
        assert!(state.rotate);

        // rotate-scan suppresses front avoidance
        let decision = policy.compute_command(&config, &mut state, &input(0.3, 0.35, 6.0));
        assert_eq!(decision.behavior, Behavior::ScanRotateToward);

        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 7.5));
        assert_eq!(decision.behavior, Behavior::ScanRotateToward);

        // 8 s after arming
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 8.0));
        assert_eq!(decision.behavior, Behavior::ScanRotateAway);
        assert_eq!(decision.command, Command::new(0.0, 1.0));
        assert!(state.rotate);

        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 10.5));
        assert_eq!(decision.behavior, Behavior::ScanRotateAway);
        assert!(state.rotate);

        // 11 s after arming: last spin, timer re-armed
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 11.0));
        assert_eq!(decision.behavior, Behavior::ScanRotateAway);
        assert!(!state.rotate);
        assert_eq!(state.rotate_time, 11.0);

        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 11.5));
        assert_eq!(decision.behavior, Behavior::WallFollow);
    }

    #[test]
    fn wall_lost_after_timeout() {
        let config = NavConfig::default();
        let policy = WallFollow::default();
        let mut state = WallFollowState {
            found_wall: true,
            time_last_wall: 0.0,
            ..running_state(0.0)
        };
        // 0.65 > 0.25 + 0.35, but only 4 s since the wall was seen
        policy.compute_command(&config, &mut state, &input(0.5, 0.65, 4.0));
        assert!(state.found_wall);

        let mut state = WallFollowState {
            found_wall: true,
            time_last_wall: 0.0,
            ..running_state(5.5)
        };
        policy.compute_command(&config, &mut state, &input(2.0, 0.65, 5.5));
        assert!(!state.found_wall);
    }

    #[test]
    fn stall_recovery_is_disabled_by_default() {
        let config = NavConfig::default();
        let policy = WallFollow::default();
        let mut state = running_state(0.0);
        let mut stalled = input(2.0, 0.35, 1.0);
        stalled.temporal.time_stationary = 30.0;
        let decision = policy.compute_command(&config, &mut state, &stalled);
        assert_eq!(decision.behavior, Behavior::WallFollow);
    }

    #[test]
    fn stall_recovery_sequence() {
        let config = NavConfig::default();
        let policy = WallFollow::new(WallFollowProp {
            stall_recovery: true,
            ..Default::default()
        });
        let mut state = running_state(0.0);

        let mut stalled = input(2.0, 0.35, 1.0);
        stalled.temporal.time_stationary = 5.0;
        let decision = policy.compute_command(&config, &mut state, &stalled);
        assert_eq!(decision.behavior, Behavior::StallReverse);
        assert_eq!(decision.command, Command::new(-0.5, 0.0));
        assert!(decision.effects.reset_stall_timer);
        assert!(state.stall && state.recovery);

        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 1.5));
        assert_eq!(decision.behavior, Behavior::StallReverse);
        assert!(!state.stall && state.recovery);

        // left is more open than right (3.5 > 0.35): rotate left
        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 2.0));
        assert_eq!(decision.behavior, Behavior::RecoveryRotate);
        assert_eq!(decision.command, Command::new(0.0, 0.8));
        assert!(decision.effects.reset_stall_timer && decision.effects.rearm_watchdog);
        assert!(!state.recovery);

        let decision = policy.compute_command(&config, &mut state, &input(2.0, 0.35, 2.5));
        assert_eq!(decision.behavior, Behavior::WallFollow);
    }
}
