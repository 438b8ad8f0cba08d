use botswarm::adapters::inbound::{SyntheticDetector, SyntheticFrameSource, SyntheticScene};
use botswarm::application::Engine;
use botswarm::common::{Clock, Point2};
use botswarm::config::Config;
use botswarm::domains::radio::{CommandKind, TickCommands};
use botswarm::domains::vision::{Detection, DetectionSnapshot, Frame, VisionCoordinator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn marker(id: u32, cx: f32, cy: f32, side: f32) -> Detection {
    let half = side / 2.0;
    Detection::new(
        id,
        [
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ],
    )
}

fn snapshot(time_ms: u64, detections: Vec<Detection>) -> DetectionSnapshot {
    DetectionSnapshot {
        frame: Frame::new(320, 240, Arc::from([]), time_ms),
        detections,
    }
}

/// Engine wired to a dormant pipeline, stepped by hand with scripted
/// snapshots. The coordinator is only there to lend the engine a reader.
fn engine_under_test(
    config: &Config,
) -> (Engine, VisionCoordinator, watch::Receiver<TickCommands>) {
    let scene = Arc::new(SyntheticScene::new(320, 240));
    let coordinator = VisionCoordinator::spawn(
        SyntheticFrameSource::new(scene.clone(), Clock::new()),
        Arc::new(SyntheticDetector::new(scene)),
        &config.vision,
    );
    let (tick_tx, tick_rx) = watch::channel(TickCommands::default());
    let engine = Engine::new(
        config,
        coordinator.reader(),
        Vec::new(),
        Clock::new(),
        tick_tx,
    );
    (engine, coordinator, tick_rx)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_pursuer_gets_a_steering_command() {
    let config = Config::default();
    let (mut engine, _coordinator, _rx) = engine_under_test(&config);

    let tick = engine.step(&snapshot(
        5,
        vec![marker(1, 240.0, 60.0, 40.0), marker(7, 80.0, 180.0, 40.0)],
    ));

    assert_eq!(tick.tracked, vec![1, 7]);
    assert_eq!(tick.commands.len(), 1, "only the pursuer is commanded");

    let cmd = &tick.commands[0];
    assert_eq!(cmd.robot_id, 7);
    assert!(matches!(cmd.kind, CommandKind::Turn | CommandKind::MotorSet));
    // PP PP ID for preamble 0, robot 7
    assert_eq!(&cmd.frame[..6], "000007");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_lost_robot_gets_one_final_stop() {
    let config = Config::default();
    let (mut engine, _coordinator, _rx) = engine_under_test(&config);

    engine.step(&snapshot(
        5,
        vec![marker(1, 240.0, 60.0, 40.0), marker(7, 80.0, 180.0, 40.0)],
    ));

    // both markers vanish but survive `undetected_limit` snapshots, still
    // steered from their last known state
    let mut time = 5;
    let mut grace_tick = None;
    for _ in 0..config.pursuit.undetected_limit {
        time += 10;
        grace_tick = Some(engine.step(&snapshot(time, Vec::new())));
    }
    let grace_tick = grace_tick.unwrap();
    assert_eq!(grace_tick.tracked, vec![1, 7]);
    assert!(grace_tick.commands.iter().all(|cmd| cmd.kind != CommandKind::End));

    // the next snapshot drops them: one final End per lost robot
    let dropping_tick = engine.step(&snapshot(time + 10, Vec::new()));
    assert_eq!(dropping_tick.commands.len(), 2);
    assert!(dropping_tick
        .commands
        .iter()
        .all(|cmd| cmd.kind == CommandKind::End));
    assert!(dropping_tick.tracked.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_missing_target_silences_the_pursuers() {
    let config = Config::default();
    let (mut engine, _coordinator, _rx) = engine_under_test(&config);

    // only a pursuer on the field, no pursued marker
    let tick = engine.step(&snapshot(5, vec![marker(7, 80.0, 180.0, 40.0)]));
    assert!(tick.commands.is_empty());
    assert_eq!(tick.tracked, vec![7]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn the_full_pipeline_reaches_the_transmitter() {
    let config = Config::default();
    let clock = Clock::new();

    let scene = Arc::new(
        SyntheticScene::new(320, 240)
            .with_marker(1, Point2::new(240.0, 60.0), (0.0, 0.0), 40.0)
            .with_marker(7, Point2::new(80.0, 180.0), (0.0, 0.0), 40.0),
    );
    let coordinator = VisionCoordinator::spawn(
        SyntheticFrameSource::new(scene.clone(), clock),
        Arc::new(SyntheticDetector::new(scene.clone())),
        &config.vision,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tick_tx, mut tick_rx) = watch::channel(TickCommands::default());
    let engine = Engine::new(
        &config,
        coordinator.reader(),
        scene.wall_segments(),
        clock,
        tick_tx,
    );
    let engine_handle = tokio::spawn(engine.run(shutdown_rx));

    let mut commanded = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let tick = tick_rx.borrow_and_update().clone();
        if tick.commands.iter().any(|cmd| cmd.robot_id == 7) {
            commanded = true;
            break;
        }
    }
    assert!(commanded, "no command for the pursuer within a second");

    let _ = shutdown_tx.send(true);
    let _ = engine_handle.await;
    coordinator.shutdown().await;
}
