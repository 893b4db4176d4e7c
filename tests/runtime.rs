use std::time::Duration;

use nalgebra::Vector2;
use reactive_nav::prelude::*;

fn random_walk_navigator(
    sensors: ChannelSensorPort,
    actuator: ChannelActuator,
) -> NavigatorNode<RandomWalk, ChannelSensorPort, ChannelActuator, TokioClock> {
    let controller =
        NavController::with_config(NavConfig::default(), RandomWalk::default(), TokioClock::new())
            .unwrap();
    NavigatorNode::new(NavigatorProp::default(), controller, sensors, actuator)
}

fn drain(commands: &mut tokio::sync::mpsc::UnboundedReceiver<Command>) -> Vec<Command> {
    let mut received = vec![];
    while let Ok(command) = commands.try_recv() {
        received.push(command);
    }
    received
}

#[tokio::test(start_paused = true)]
async fn commands_follow_the_control_period() {
    let (publisher, sensors) = sensor_channel();
    let (actuator, mut commands) = actuation_channel();

    let mut pipeline = Pipeline::new();
    let cancel = pipeline.cancel_request_sender();
    pipeline.add(random_walk_navigator(sensors, actuator));
    let running = tokio::spawn(pipeline.run());

    // ticks at 0.5s and 1.0s find no data
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(drain(&mut commands).is_empty());

    publisher
        .publish_scan(Stamped::from_stamp_counter_and_value(
            1.2,
            0,
            &LaserScan::from_ranges(vec![2.0; 360]),
        ))
        .unwrap();
    publisher
        .publish_pose(Stamped::from_stamp_counter_and_value(1.2, 0, &Pose::default()))
        .unwrap();

    // ticks at 1.5s, 2.0s, 2.5s and 3.0s
    tokio::time::sleep(Duration::from_millis(2000)).await;
    let received = drain(&mut commands);
    assert_eq!(received, vec![Command::new(0.0, 2.094); 4]);

    cancel.send(CancelRequest).unwrap();
    let pipeline = running.await.unwrap();
    assert_eq!(pipeline.node_names(), vec!["navigator".to_owned()]);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(commands.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn navigator_stops_when_the_sensors_are_gone() {
    let (publisher, sensors) = sensor_channel();
    let (actuator, mut commands) = actuation_channel();

    let mut pipeline = Pipeline::new();
    pipeline.add(random_walk_navigator(sensors, actuator));
    drop(publisher);

    // the returning node cancels the pipeline on its own
    let pipeline = pipeline.run().await;
    assert_eq!(pipeline.len(), 1);
    assert!(commands.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn simulated_wall_follow_explores_the_room() {
    let (publisher, sensors) = sensor_channel();
    let (actuator, commands) = actuation_channel();
    let prop = SimProp {
        shutdown_time: Some(30.0),
        dropout_rate: 0.01,
        seed: 3,
        ..Default::default()
    };
    let radius = prop.radius;

    let room = Room::rectangle(4.0, 3.0);
    let robot = SimRobot::new(prop, Vector2::new(2.0, 1.5), 0.0);

    let mut pipeline = Pipeline::new();
    let sim = SimNode::new(room.clone(), robot, publisher, commands)
        .with_cancel_request(pipeline.cancel_request_sender());
    let truth = sim.subscribe();
    let controller =
        NavController::with_config(NavConfig::default(), WallFollow::default(), TokioClock::new())
            .unwrap();
    pipeline
        .add(sim)
        .add(NavigatorNode::new(NavigatorProp::default(), controller, sensors, actuator));

    let pipeline = pipeline.run().await;
    assert_eq!(pipeline.len(), 2);

    let truth = truth.borrow().clone();
    assert!(truth.time >= 30.0);
    assert!(truth.distance_travelled > 1.0);
    let position = Vector2::new(truth.pose.position.x, truth.pose.position.y);
    assert!(room.contains(&position));
    // the simulator never had to hold the robot back at a wall
    assert_eq!(truth.blocked_steps, 0);
    assert!(truth.min_clearance > radius + 0.05);
}
