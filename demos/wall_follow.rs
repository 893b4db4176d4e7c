use nalgebra::Vector2;
use reactive_nav::prelude::*;

async fn run_wall_follow_example() -> reactive_nav::Result<()> {
    let (sensor_publisher, sensors) = sensor_channel();
    let (actuator, commands) = actuation_channel();

    let room = Room::rectangle(4.0, 3.0)
        .with_obstacle(Vector2::new(2.5, 1.2), Vector2::new(3.0, 1.8));
    let robot = SimRobot::new(
        SimProp {
            dropout_rate: 0.01,
            shutdown_time: Some(120.0),
            draw_period: Some(1.0),
            ..Default::default()
        },
        Vector2::new(1.0, 1.5),
        0.0,
    );

    let mut pipeline = Pipeline::new();
    let sim = SimNode::new(room, robot, sensor_publisher, commands)
        .with_cancel_request(pipeline.cancel_request_sender());
    let controller =
        NavController::with_config(NavConfig::default(), WallFollow::default(), TokioClock::new())?;
    let navigator = NavigatorNode::new(NavigatorProp::default(), controller, sensors, actuator);

    pipeline.add(sim).add(navigator);
    pipeline.install_ctrlc_handler()?;

    let _pipeline = pipeline.run().await;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            if let Err(err) = run_wall_follow_example().await {
                tracing::error!("{}", err);
            }
        })
}
