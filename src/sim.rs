//! A small 2d simulator: a walled room, a differential drive robot, a noisy lidar and
//! odometry. It stands in for the robot and its transport in demos and tests.

/// Wall segments, ray casting and clearance queries.
pub mod world;
pub use world::{Room, Segment};

/// Simulated robot and the node driving it.
pub mod robot;
pub use robot::{GroundTruth, SimNode, SimProp, SimRobot};

/// Braille rendering for the terminal.
pub mod draw;
pub use draw::render;
