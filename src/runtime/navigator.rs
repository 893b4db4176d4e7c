use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::controller::NavController;
use crate::policy::NavigationPolicy;
use crate::ports::{ActuationPort, SensorPort, SensorSample};
use crate::runtime::Node;

/// Properties of the navigator node.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigatorProp {
    /// Name used in log messages.
    pub name: String,
}

impl Default for NavigatorProp {
    fn default() -> Self {
        Self {
            name: "navigator".to_owned(),
        }
    }
}

/// The control loop: a sensor driven cache plus a periodic command timer.
///
/// Sensor samples never produce a command. Every
/// [control_period](crate::config::NavConfig::control_period) seconds of the controller's
/// configuration, starting one period
/// after [Node::run] is entered, the controller ticks and its command, if any, is sent to the
/// actuator. On shutdown the timer is stopped before the actuator is released, so no command
/// follows the shutdown.
pub struct NavigatorNode<P: NavigationPolicy, S: SensorPort, A: ActuationPort, C: Clock> {
    prop: NavigatorProp,
    controller: NavController<P, C>,
    sensors: S,
    actuator: Option<A>,
}

impl<P, S, A, C> NavigatorNode<P, S, A, C>
where
    P: NavigationPolicy,
    S: SensorPort,
    A: ActuationPort,
    C: Clock,
{
    /// Create a navigator node.
    pub fn new(
        prop: NavigatorProp,
        controller: NavController<P, C>,
        sensors: S,
        actuator: A,
    ) -> Self {
        Self {
            prop,
            controller,
            sensors,
            actuator: Some(actuator),
        }
    }

    /// The controller.
    pub fn controller(&self) -> &NavController<P, C> {
        &self.controller
    }

    /// Whether the actuator has been released.
    pub fn is_shut_down(&self) -> bool {
        self.actuator.is_none()
    }
}

#[async_trait]
impl<P, S, A, C> Node for NavigatorNode<P, S, A, C>
where
    P: NavigationPolicy,
    S: SensorPort + 'static,
    A: ActuationPort + 'static,
    C: Clock + 'static,
{
    fn name(&self) -> &str {
        &self.prop.name
    }

    async fn run(&mut self, mut kill: broadcast::Receiver<()>) {
        let Some(mut actuator) = self.actuator.take() else {
            warn!("{}: actuator already released", self.prop.name);
            return;
        };
        let control_period = self.controller.config().control_period;
        info!(
            "{}: {} policy, tick every {}s",
            self.prop.name,
            self.controller.policy().name(),
            control_period
        );

        let period = Duration::from_secs_f64(control_period);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = kill.recv() => break,
                sample = self.sensors.recv() => match sample {
                    Ok(SensorSample::Scan(scan)) => self.controller.on_scan(&scan.value),
                    Ok(SensorSample::Pose(pose)) => self.controller.on_pose(pose.value),
                    Err(err) => {
                        warn!("{}: {}", self.prop.name, err);
                        break;
                    }
                },
                _ = interval.tick() => {
                    let Some(command) = self.controller.tick() else {
                        continue;
                    };
                    if let Err(err) = actuator.send_velocity(command) {
                        warn!("{}: {}", self.prop.name, err);
                        break;
                    }
                }
            }
        }

        drop(interval);
        drop(actuator);
        info!("{}: shut down", self.prop.name);
    }
}
