//! Boundary adapters between the control loop and the transport.
//!
//! The transport itself is an external collaborator. It only has to deliver the latest range
//! scan and pose ([SensorPort]) and accept velocity commands ([ActuationPort]). The channel
//! based implementations in this module connect the control loop to in-process producers
//! such as the simulator.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::{NavError, Result};
use crate::policy::Command;
use crate::sensing::{LaserScan, Pose, Stamped};

/// A sample delivered by a [SensorPort].
#[derive(Clone, Debug, PartialEq)]
pub enum SensorSample {
    /// A new range scan.
    Scan(Stamped<LaserScan>),
    /// A new odometry pose.
    Pose(Stamped<Pose>),
}

/// Source of sensor samples, best effort and latest sample wins.
#[async_trait]
pub trait SensorPort: Send {
    /// Waits for the next sample. Fails once the producer is gone.
    async fn recv(&mut self) -> Result<SensorSample>;

    /// Latest scan, if any has been received.
    fn latest_scan(&self) -> Option<LaserScan>;

    /// Latest pose, if any has been received.
    fn latest_pose(&self) -> Option<Pose>;
}

/// Sink of velocity commands. Fire and forget, no acknowledgement.
pub trait ActuationPort: Send {
    /// Send a command; it supersedes any previous one.
    fn send_velocity(&mut self, command: Command) -> Result<()>;
}

/// Producer side of a [ChannelSensorPort].
#[derive(Debug)]
pub struct SensorPublisher {
    scans: watch::Sender<Option<Stamped<LaserScan>>>,
    poses: watch::Sender<Option<Stamped<Pose>>>,
}

impl SensorPublisher {
    /// Publish a scan, replacing any unread one.
    pub fn publish_scan(&self, scan: Stamped<LaserScan>) -> Result<()> {
        self.scans
            .send(Some(scan))
            .map_err(|_| NavError::PortClosed("scan"))
    }

    /// Publish a pose, replacing any unread one.
    pub fn publish_pose(&self, pose: Stamped<Pose>) -> Result<()> {
        self.poses
            .send(Some(pose))
            .map_err(|_| NavError::PortClosed("odometry"))
    }
}

/// [SensorPort] fed through tokio watch channels.
#[derive(Clone, Debug)]
pub struct ChannelSensorPort {
    scans: watch::Receiver<Option<Stamped<LaserScan>>>,
    poses: watch::Receiver<Option<Stamped<Pose>>>,
}

/// Create a connected sensor publisher and port.
pub fn sensor_channel() -> (SensorPublisher, ChannelSensorPort) {
    let (scan_tx, scan_rx) = watch::channel(None);
    let (pose_tx, pose_rx) = watch::channel(None);
    (
        SensorPublisher {
            scans: scan_tx,
            poses: pose_tx,
        },
        ChannelSensorPort {
            scans: scan_rx,
            poses: pose_rx,
        },
    )
}

#[async_trait]
impl SensorPort for ChannelSensorPort {
    async fn recv(&mut self) -> Result<SensorSample> {
        let Self { scans, poses } = self;
        loop {
            tokio::select! {
                changed = scans.changed() => {
                    changed.map_err(|_| NavError::PortClosed("scan"))?;
                    if let Some(scan) = scans.borrow_and_update().clone() {
                        return Ok(SensorSample::Scan(scan));
                    }
                }
                changed = poses.changed() => {
                    changed.map_err(|_| NavError::PortClosed("odometry"))?;
                    if let Some(pose) = poses.borrow_and_update().clone() {
                        return Ok(SensorSample::Pose(pose));
                    }
                }
            }
        }
    }

    fn latest_scan(&self) -> Option<LaserScan> {
        self.scans.borrow().as_ref().map(|scan| scan.value.clone())
    }

    fn latest_pose(&self) -> Option<Pose> {
        self.poses.borrow().as_ref().map(|pose| pose.value.clone())
    }
}

/// [ActuationPort] backed by an unbounded tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelActuator {
    sender: mpsc::UnboundedSender<Command>,
}

/// Create a connected actuator and command receiver.
pub fn actuation_channel() -> (ChannelActuator, mpsc::UnboundedReceiver<Command>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelActuator { sender }, receiver)
}

impl ActuationPort for ChannelActuator {
    fn send_velocity(&mut self, command: Command) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| NavError::PortClosed("actuation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_sample_wins() {
        let (publisher, mut port) = sensor_channel();
        assert!(port.latest_scan().is_none());

        for seq in 0..3 {
            let scan = LaserScan::from_ranges(vec![seq as f64; 4]);
            publisher
                .publish_scan(Stamped::from_stamp_counter_and_value(0.0, seq, &scan))
                .unwrap();
        }
        match port.recv().await.unwrap() {
            SensorSample::Scan(scan) => assert_eq!(scan.seq, 2),
            other => panic!("unexpected sample {other:?}"),
        }
        assert_eq!(port.latest_scan().unwrap().ranges, vec![2.0; 4]);

        publisher
            .publish_pose(Stamped::from_stamp_counter_and_value(
                1.0,
                0,
                &Pose::planar(1.0, 0.0, 0.0),
            ))
            .unwrap();
        assert!(matches!(port.recv().await.unwrap(), SensorSample::Pose(_)));
        assert_eq!(port.latest_pose(), Some(Pose::planar(1.0, 0.0, 0.0)));
    }

    #[tokio::test]
    async fn closed_ports_report_errors() {
        let (publisher, mut port) = sensor_channel();
        drop(publisher);
        assert!(matches!(port.recv().await, Err(NavError::PortClosed(_))));

        let (mut actuator, receiver) = actuation_channel();
        actuator.send_velocity(Command::STOP).unwrap();
        drop(receiver);
        assert!(actuator.send_velocity(Command::STOP).is_err());
    }
}
