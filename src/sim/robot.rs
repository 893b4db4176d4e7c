use std::f64::consts::{PI, TAU};

use async_trait::async_trait;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::policy::Command;
use crate::ports::SensorPublisher;
use crate::runtime::{CancelRequest, Node};
use crate::sensing::{LaserScan, Pose, ScanGeometry, Stamped};
use crate::sim::draw::render;
use crate::sim::world::Room;
use crate::tracking::normalize_angle;

/// Properties of the simulated robot and its sensors.
#[derive(Clone, Debug, PartialEq)]
pub struct SimProp {
    /// Integration step in seconds.
    pub step: f64,
    /// Radius of the robot body in meters.
    pub radius: f64,
    /// Number of lidar beams per revolution.
    pub beams: usize,
    /// Lidar range in meters; returns beyond it read `+Inf`.
    pub max_range: f64,
    /// Standard deviation of the Gaussian range noise in meters.
    pub range_noise: f64,
    /// Probability of a beam reading `NaN`.
    pub dropout_rate: f64,
    /// Seconds between two published scans.
    pub scan_period: f64,
    /// Simulated time after which the pipeline is asked to shut down.
    pub shutdown_time: Option<f64>,
    /// Seconds between two rendered frames; no rendering if `None`.
    pub draw_period: Option<f64>,
    /// Seed of the noise generator.
    pub seed: u64,
}

impl Default for SimProp {
    fn default() -> Self {
        Self {
            step: 0.05,
            radius: 0.105,
            beams: 360,
            max_range: 3.5,
            range_noise: 0.01,
            dropout_rate: 0.0,
            scan_period: 0.2,
            shutdown_time: None,
            draw_period: None,
            seed: 0,
        }
    }
}

/// A differential drive robot in a [Room].
#[derive(Clone, Debug)]
pub struct SimRobot {
    prop: SimProp,
    position: Vector2<f64>,
    yaw: f64,
    command: Command,
    rng: StdRng,
    noise: Option<Normal<f64>>,
    distance_travelled: f64,
    blocked_steps: u64,
    trail: Vec<Vector2<f64>>,
}

impl SimRobot {
    const TRAIL_SPACING: f64 = 0.05;

    /// Place a robot at `position`, facing `yaw`.
    pub fn new(prop: SimProp, position: Vector2<f64>, yaw: f64) -> Self {
        let noise = if prop.range_noise > 0.0 {
            Normal::new(0.0, prop.range_noise).ok()
        } else {
            None
        };
        Self {
            rng: StdRng::seed_from_u64(prop.seed),
            noise,
            prop,
            position,
            yaw: normalize_angle(yaw),
            command: Command::STOP,
            distance_travelled: 0.0,
            blocked_steps: 0,
            trail: vec![position],
        }
    }

    /// Properties.
    pub fn prop(&self) -> &SimProp {
        &self.prop
    }

    /// Replace the active velocity command.
    pub fn set_command(&mut self, command: Command) {
        self.command = command;
    }

    /// The active velocity command.
    pub fn command(&self) -> Command {
        self.command
    }

    /// Integrate the unicycle model over `dt` seconds.
    ///
    /// The heading always changes. The translation is dropped if it would bring the body
    /// closer to a wall than its radius; returns false in that case.
    pub fn step(&mut self, room: &Room, dt: f64) -> bool {
        let distance = self.command.linear * dt;
        let candidate = self.position + Vector2::new(self.yaw.cos(), self.yaw.sin()) * distance;
        self.yaw = normalize_angle(self.yaw + self.command.angular * dt);

        let clearance = room.clearance(&candidate);
        if clearance < self.prop.radius && clearance < room.clearance(&self.position) {
            self.blocked_steps += 1;
            return false;
        }
        self.position = candidate;
        self.distance_travelled += distance.abs();
        if self
            .trail
            .last()
            .map_or(true, |last| (self.position - last).norm() >= Self::TRAIL_SPACING)
        {
            self.trail.push(self.position);
        }
        true
    }

    /// Position in meters.
    pub fn position(&self) -> Vector2<f64> {
        self.position
    }

    /// Heading in radians, in [-π, π].
    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    /// Odometry pose.
    pub fn pose(&self) -> Pose {
        Pose::planar(self.position.x, self.position.y, self.yaw)
    }

    /// Path length driven so far.
    pub fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    /// Number of steps whose translation was blocked by a wall.
    pub fn blocked_steps(&self) -> u64 {
        self.blocked_steps
    }

    /// Positions visited, spaced a few centimeters apart.
    pub fn trail(&self) -> &[Vector2<f64>] {
        &self.trail
    }

    /// Bearing of beam `index` relative to the heading.
    ///
    /// Beam 0 looks backwards, the middle beam straight ahead and indices grow clockwise, so
    /// the left side precedes the front which precedes the right side.
    pub fn beam_bearing(&self, index: usize) -> f64 {
        PI - index as f64 * self.beam_increment()
    }

    fn beam_increment(&self) -> f64 {
        TAU / self.prop.beams.max(1) as f64
    }

    /// A noisy lidar scan from the current position.
    pub fn scan(&mut self, room: &Room) -> LaserScan {
        let mut ranges = Vec::with_capacity(self.prop.beams);
        for index in 0..self.prop.beams {
            let heading = self.yaw + self.beam_bearing(index);
            let range = match room.ray_cast(&self.position, heading, self.prop.max_range) {
                Some(distance) => {
                    let noise = self
                        .noise
                        .as_ref()
                        .map_or(0.0, |normal| normal.sample(&mut self.rng));
                    let noisy = distance + noise;
                    if noisy > self.prop.max_range {
                        f64::INFINITY
                    } else {
                        noisy.max(0.0)
                    }
                }
                None => f64::INFINITY,
            };
            let dropout =
                self.prop.dropout_rate > 0.0 && self.rng.gen::<f64>() < self.prop.dropout_rate;
            ranges.push(if dropout { f64::NAN } else { range });
        }
        LaserScan {
            ranges,
            geometry: Some(ScanGeometry {
                angle_min: PI,
                angle_increment: -self.beam_increment(),
                range_min: 0.0,
                range_max: self.prop.max_range,
            }),
        }
    }
}

/// Ground truth published by the [SimNode] after each step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroundTruth {
    /// Simulated time in seconds.
    pub time: f64,
    /// True pose.
    pub pose: Pose,
    /// Path length driven so far.
    pub distance_travelled: f64,
    /// Number of blocked steps.
    pub blocked_steps: u64,
    /// Distance of the robot center to the closest wall.
    pub clearance: f64,
    /// Smallest clearance over all steps so far.
    pub min_clearance: f64,
}

/// Drives a [SimRobot] in simulated time and publishes its scans and poses.
pub struct SimNode {
    prop: SimProp,
    room: Room,
    robot: SimRobot,
    sensors: SensorPublisher,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel_request: Option<mpsc::UnboundedSender<CancelRequest>>,
    truth: watch::Sender<GroundTruth>,
    min_clearance: f64,
    seq: u64,
}

impl SimNode {
    /// Create a simulation node. Its properties are those of `robot`.
    pub fn new(
        room: Room,
        robot: SimRobot,
        sensors: SensorPublisher,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let (truth, _) = watch::channel(GroundTruth::default());
        Self {
            prop: robot.prop().clone(),
            room,
            robot,
            sensors,
            commands,
            cancel_request: None,
            truth,
            min_clearance: f64::INFINITY,
            seq: 0,
        }
    }

    /// Request the pipeline to shut down once `shutdown_time` has been simulated.
    pub fn with_cancel_request(mut self, sender: mpsc::UnboundedSender<CancelRequest>) -> Self {
        self.cancel_request = Some(sender);
        self
    }

    /// Subscribe to the ground truth.
    pub fn subscribe(&self) -> watch::Receiver<GroundTruth> {
        self.truth.subscribe()
    }

    fn time(&self) -> f64 {
        self.seq as f64 * self.prop.step
    }

    fn apply_pending_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.robot.set_command(command),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if !self.robot.command().is_stop() {
                        debug!("command channel closed, stopping");
                        self.robot.set_command(Command::STOP);
                    }
                    break;
                }
            }
        }
    }

    fn publish(&mut self, with_scan: bool) -> crate::error::Result<()> {
        let time = self.time();
        if with_scan {
            let scan = self.robot.scan(&self.room);
            self.sensors
                .publish_scan(Stamped::from_stamp_counter_and_value(time, self.seq, &scan))?;
        }
        self.sensors.publish_pose(Stamped::from_stamp_counter_and_value(
            time,
            self.seq,
            &self.robot.pose(),
        ))
    }
}

/// True on every step whose index is a multiple of `period` expressed in steps.
fn every(seq: u64, period: f64, step: f64) -> bool {
    let steps = (period / step).round().max(1.0) as u64;
    seq % steps == 0
}

#[async_trait]
impl Node for SimNode {
    fn name(&self) -> &str {
        "sim"
    }

    async fn run(&mut self, mut kill: broadcast::Receiver<()>) {
        if !(self.prop.step > 0.0 && self.prop.step.is_finite()) {
            warn!("sim: invalid step {}", self.prop.step);
            return;
        }
        let mut interval = tokio::time::interval(Duration::from_secs_f64(self.prop.step));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = kill.recv() => break,
                _ = interval.tick() => {}
            }
            let time = self.time();

            self.apply_pending_commands();
            let with_scan = every(self.seq, self.prop.scan_period, self.prop.step);
            if let Err(err) = self.publish(with_scan) {
                warn!("sim: {}", err);
                break;
            }
            if let Some(draw_period) = self.prop.draw_period {
                if every(self.seq, draw_period, self.prop.step) {
                    println!("time:{:.2}\n{}", time, render(&self.room, &self.robot));
                }
            }
            if self.prop.shutdown_time.is_some_and(|shutdown| time >= shutdown) {
                if let Some(cancel_request) = self.cancel_request.take() {
                    info!("sim: shutdown time reached at {:.2}s", time);
                    if cancel_request.send(CancelRequest).is_err() {
                        warn!("sim: pipeline is gone");
                    }
                }
            }

            self.robot.step(&self.room, self.prop.step);
            self.seq += 1;
            let clearance = self.room.clearance(&self.robot.position());
            self.min_clearance = self.min_clearance.min(clearance);
            self.truth.send_replace(GroundTruth {
                time: self.time(),
                pose: self.robot.pose(),
                distance_travelled: self.robot.distance_travelled(),
                blocked_steps: self.robot.blocked_steps(),
                clearance,
                min_clearance: self.min_clearance,
            });
        }

        info!(
            "sim: stopped at {:.2}s after {:.2}m, {} blocked steps",
            self.time(),
            self.robot.distance_travelled(),
            self.robot.blocked_steps()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LEFT_FRONT_INDEX, LEFT_SIDE_INDEX, RIGHT_FRONT_INDEX, RIGHT_SIDE_INDEX};
    use crate::sensing::{aggregate, clean, SectorBounds};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn noiseless() -> SimProp {
        SimProp {
            range_noise: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn beams_map_onto_the_sectors() {
        let robot = SimRobot::new(noiseless(), Vector2::new(1.0, 1.0), 0.0);
        assert_relative_eq!(robot.beam_bearing(180), 0.0, epsilon = 1e-12);
        assert_relative_eq!(robot.beam_bearing(90), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(robot.beam_bearing(270), -FRAC_PI_2, epsilon = 1e-12);
        assert!(robot.beam_bearing(LEFT_SIDE_INDEX) > robot.beam_bearing(LEFT_FRONT_INDEX));
        assert!(robot.beam_bearing(RIGHT_FRONT_INDEX) > robot.beam_bearing(RIGHT_SIDE_INDEX));
    }

    #[test]
    fn scan_sees_walls_on_the_correct_side() {
        let room = Room::rectangle(4.0, 4.0);
        // facing +x, wall 0.3m to the right, 1.5m ahead
        let mut robot = SimRobot::new(noiseless(), Vector2::new(2.5, 0.3), 0.0);
        let scan = robot.scan(&room);
        assert_eq!(scan.ranges.len(), 360);
        assert_relative_eq!(scan.ranges[180], 1.5, epsilon = 1e-9);
        assert_relative_eq!(scan.ranges[270], 0.3, epsilon = 1e-9);
        // the opposite wall is out of range
        assert_eq!(scan.ranges[90], f64::INFINITY);

        let minima = aggregate(&clean(&scan.ranges), &SectorBounds::default()).unwrap();
        assert_relative_eq!(minima.right, 0.3, epsilon = 1e-3);
        assert!(minima.right < minima.front);
        assert!(minima.front < minima.left);
    }

    #[test]
    fn dropouts_read_nan() {
        let mut robot = SimRobot::new(
            SimProp {
                dropout_rate: 1.0,
                ..noiseless()
            },
            Vector2::new(2.0, 2.0),
            0.0,
        );
        let scan = robot.scan(&Room::rectangle(4.0, 4.0));
        assert!(scan.ranges.iter().all(|r| r.is_nan()));
    }

    #[test]
    fn walls_block_translation_but_not_rotation() {
        let room = Room::rectangle(4.0, 4.0);
        let mut robot = SimRobot::new(noiseless(), Vector2::new(3.8, 2.0), 0.0);
        robot.set_command(Command::new(1.0, 1.0));
        assert!(!robot.step(&room, 0.1));
        assert_eq!(robot.position(), Vector2::new(3.8, 2.0));
        assert_relative_eq!(robot.yaw(), 0.1, epsilon = 1e-12);
        assert_eq!(robot.blocked_steps(), 1);

        // backing away from the wall is always possible
        robot.set_command(Command::new(-1.0, 0.0));
        assert!(robot.step(&room, 0.1));
        assert!(robot.position().x < 3.8);
        assert_relative_eq!(robot.distance_travelled(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn periodic_steps() {
        assert!(every(0, 0.2, 0.05));
        assert!(!every(3, 0.2, 0.05));
        assert!(every(4, 0.2, 0.05));
        // periods shorter than a step fire every step
        assert!(every(7, 0.01, 0.05));
    }

    #[test]
    fn odometry_encodes_the_heading() {
        let robot = SimRobot::new(noiseless(), Vector2::new(1.0, 2.0), 3.0 * FRAC_PI_2);
        let pose = robot.pose();
        assert_relative_eq!(pose.yaw(), -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(pose.position.x, 1.0);
        assert_relative_eq!(pose.position.y, 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn ground_truth_keeps_the_closest_approach() {
        let (publisher, _sensors) = crate::ports::sensor_channel();
        let (command_sender, commands) = mpsc::unbounded_channel();
        let robot = SimRobot::new(noiseless(), Vector2::new(3.0, 2.0), 0.0);
        let mut node = SimNode::new(Room::rectangle(4.0, 4.0), robot, publisher, commands);
        let truth = node.subscribe();
        command_sender.send(Command::new(0.5, 0.0)).unwrap();

        let (kill_sender, kill) = broadcast::channel(1);
        let handle = tokio::spawn(async move { node.run(kill).await });
        // the wall is reached after about 1.8s
        tokio::time::sleep(Duration::from_secs(2)).await;
        command_sender.send(Command::new(-0.5, 0.0)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        kill_sender.send(()).unwrap();
        handle.await.unwrap();

        let truth = truth.borrow().clone();
        assert!(truth.blocked_steps > 0);
        assert!(truth.min_clearance >= 0.105);
        assert!(truth.min_clearance < 0.13);
        assert!(truth.clearance > truth.min_clearance + 0.3);
    }
}
