use nalgebra::Vector2;
use reactive_nav::prelude::*;

async fn run_random_walk_example() -> reactive_nav::Result<()> {
    let (sensor_publisher, sensors) = sensor_channel();
    let (actuator, commands) = actuation_channel();

    let robot = SimRobot::new(
        SimProp {
            shutdown_time: Some(10.0),
            draw_period: Some(0.5),
            ..Default::default()
        },
        Vector2::new(1.5, 1.5),
        0.0,
    );

    let mut pipeline = Pipeline::new();
    let sim = SimNode::new(Room::rectangle(3.0, 3.0), robot, sensor_publisher, commands)
        .with_cancel_request(pipeline.cancel_request_sender());
    let controller = NavController::with_config(
        NavConfig::default(),
        RandomWalk::new(RandomWalkProp {
            normalize_yaw: true,
            ..Default::default()
        }),
        TokioClock::new(),
    )?;
    let navigator = NavigatorNode::new(
        NavigatorProp {
            name: "random walk".to_owned(),
            ..Default::default()
        },
        controller,
        sensors,
        actuator,
    );

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
            if let Err(err) = run_random_walk_example().await {
                tracing::error!("{}", err);
            }
        })
}
