use botswarm::Config;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use botswarm::adapters::inbound::{SyntheticDetector, SyntheticFrameSource, SyntheticScene};
use botswarm::adapters::outbound::{SerialRadio, TraceRadio};
use botswarm::application::{Engine, Transmitter};
use botswarm::common::{ApplicationResult, Clock, Point2};
use botswarm::domains::radio::{RadioChannel, TickCommands};
use botswarm::domains::vision::VisionCoordinator;

#[tokio::main]
async fn main() -> ApplicationResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting botswarm coordination engine");

    // Load configuration, falling back to the built-in defaults
    let config = match Config::from_file("config.toml").await {
        Ok(config) => {
            info!("Configuration loaded from config.toml");
            config
        }
        Err(err) => {
            warn!(%err, "config.toml not usable, running with defaults");
            Config::default()
        }
    };

    // One monotonic clock for every deadline in the process
    let clock = Clock::new();

    // Demo playing field: a wall across the middle with a gap, one pursued
    // marker and two pursuers. A camera rig replaces this through the same
    // FrameSource/Detector ports.
    let scene = Arc::new(
        SyntheticScene::new(640, 480)
            .with_wall(Point2::new(0.0, 240.0), Point2::new(280.0, 240.0))
            .with_wall(Point2::new(360.0, 240.0), Point2::new(640.0, 240.0))
            .with_marker(1, Point2::new(320.0, 120.0), (12.0, 0.0), 40.0)
            .with_marker(7, Point2::new(120.0, 400.0), (0.0, 0.0), 40.0)
            .with_marker(8, Point2::new(520.0, 400.0), (0.0, 0.0), 40.0),
    );

    let coordinator = VisionCoordinator::spawn(
        SyntheticFrameSource::new(scene.clone(), clock),
        Arc::new(SyntheticDetector::new(scene.clone())),
        &config.vision,
    );

    let radio: Box<dyn RadioChannel> = match &config.radio.device {
        Some(device) => Box::new(SerialRadio::open(device, config.radio.baud_rate)?),
        None => {
            info!("no radio device configured, logging frames instead");
            Box::new(TraceRadio::default())
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tick_tx, tick_rx) = watch::channel(TickCommands::default());

    let engine = Engine::new(
        &config,
        coordinator.reader(),
        scene.wall_segments(),
        clock,
        tick_tx,
    );
    let transmitter = Transmitter::new(&config, radio, tick_rx, clock);

    let engine_handle = tokio::spawn(engine.run(shutdown_rx.clone()));
    let transmitter_handle = tokio::spawn(transmitter.run(shutdown_rx));

    info!("botswarm running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down botswarm");

    let _ = shutdown_tx.send(true);
    let _ = engine_handle.await;
    let _ = transmitter_handle.await;
    coordinator.shutdown().await;

    Ok(())
}
