#![deny(missing_docs)]

//! # Reactive navigation
//!
//! A reactive navigation controller for a differential drive robot with a planar 360° range
//! scanner and odometry. Every control tick the controller reduces the latest range scan to
//! three sector minima (left, front, right), combines them with a small temporal state and
//! emits exactly one velocity command. There is no map, no planning and no localization.
//!
//! Two behaviors are provided:
//!
//! - [RandomWalk](policy::RandomWalk) spins in place until the heading differs by half a turn
//!   from the heading of the first odometry sample, then stops.
//! - [WallFollow](policy::WallFollow) keeps a wall on its right, turns away from obstacles in
//!   front, periodically rotates toward and away from the wall to scan it, and gives up on a
//!   wall once it has been out of reach for a while.
//!
//! ## Module Overview
//!
//! - [sensing]: scan cleaning (`+Inf` and `NaN` become sentinels), sector reduction and pose
//!   handling.
//! - [tracking]: the temporal state derived from pose samples: yaw origin, stall timer,
//!   travelled distance.
//! - [policy]: the behavior state machines behind the [NavigationPolicy] trait.
//! - [controller]: the [NavController] orchestrating one tick: cached scan and pose in, one
//!   command out.
//! - [ports] and [runtime]: the boundary to the transport and the periodic control loop,
//!   executed as tokio tasks inside a [Pipeline].
//! - [sim]: a small simulated room with a lidar, used by the demos and integration tests.
//!
//! ## Example
//!
//! The controller is synchronous. Sensor callbacks only replace cached state, commands are
//! produced by the tick:
//!
//! ```rust
//! use reactive_nav::prelude::*;
//!
//! let clock = ManualClock::default();
//! let mut controller =
//!     NavController::with_config(NavConfig::default(), WallFollow::default(), clock.clone())
//!         .unwrap();
//!
//! // no command until both a scan and a pose arrived
//! assert_eq!(controller.tick(), None);
//!
//! let mut ranges = vec![f64::INFINITY; 360];
//! // obstacle 0.5m ahead
//! ranges[180] = 0.5;
//! controller.on_scan(&LaserScan::from_ranges(ranges));
//! controller.on_pose(Pose::planar(0.0, 0.0, 0.0));
//!
//! clock.advance(0.5);
//! let command = controller.tick().unwrap();
//! assert_eq!(command, Command::new(0.07, 0.5));
//! assert_eq!(
//!     controller.last_decision().map(|decision| decision.behavior),
//!     Some(Behavior::AvoidFront)
//! );
//! ```
//!
//! See the `random_walk` and `wall_follow` demos for the controller running against the
//! simulator inside a [Pipeline].

/// Error type.
pub mod error;
pub use error::{NavError, Result};

/// Named constants and shared tunables.
pub mod config;
pub use config::NavConfig;

/// Time sources.
pub mod clock;
pub use clock::{Clock, ManualClock, TokioClock};

/// Range scan cleaning, sector reduction and poses.
pub mod sensing;

/// Temporal state across ticks.
pub mod tracking;
pub use tracking::{TemporalSnapshot, TemporalStateTracker, TrackerProp};

/// Behavior state machines.
pub mod policy;
pub use policy::{Behavior, Command, Decision, NavigationPolicy};

/// Per tick orchestration.
pub mod controller;
pub use controller::NavController;

/// Sensor and actuation ports.
pub mod ports;

/// Control loop node and pipeline.
pub mod runtime;
pub use runtime::{CancelRequest, NavigatorNode, NavigatorProp, Node, Pipeline};

/// Simulated room and robot.
pub mod sim;

/// The prelude module contains the most important traits and structs of the library.
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, TokioClock};
    pub use crate::config::NavConfig;
    pub use crate::controller::NavController;
    pub use crate::error::{NavError, Result};
    pub use crate::policy::{
        Behavior, Command, ControlInput, Decision, NavigationPolicy, RandomWalk, RandomWalkProp,
        WallFollow, WallFollowProp,
    };
    pub use crate::ports::{
        actuation_channel, sensor_channel, ActuationPort, ChannelActuator, ChannelSensorPort,
        SensorPort, SensorPublisher, SensorSample,
    };
    pub use crate::runtime::{CancelRequest, NavigatorNode, NavigatorProp, Node, Pipeline};
    pub use crate::sensing::{LaserScan, Pose, SectorMinima, Stamped};
    pub use crate::sim::{Room, SimNode, SimProp, SimRobot};
    pub use crate::tracking::{TrackerProp, WatchdogProp};
}
