use botswarm::application::Transmitter;
use botswarm::common::{Clock, Point2};
use botswarm::config::Config;
use botswarm::domains::radio::protocol::BUFFER_END;
use botswarm::domains::radio::{CommandKind, CommandProtocol, RadioChannel, TickCommand, TickCommands};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::watch;

struct CaptureRadio {
    sent: mpsc::Sender<String>,
}

impl RadioChannel for CaptureRadio {
    fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let _ = self.sent.send(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    fn close(&mut self) {}
}

fn motor_tick(time_ms: u64) -> (TickCommands, String) {
    let protocol = CommandProtocol::new(0);
    let frame = protocol
        .generate(5, CommandKind::MotorSet, &[120, -120])
        .unwrap();
    let tick = TickCommands {
        commands: vec![TickCommand {
            robot_id: 5,
            kind: CommandKind::MotorSet,
            frame: frame.clone(),
            center: Point2::new(100.0, 100.0),
            mid: Point2::new(100.0, 95.0),
            target: Point2::new(150.0, 100.0),
            target_angle: 0.0,
            motor_powers: (120, -120),
        }],
        tracked: vec![5],
        time_ms,
    };
    (tick, frame)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ticks_flow_to_the_radio_exactly_once() {
    let config = Config::default();
    let (captured_tx, captured_rx) = mpsc::channel();
    let (tick_tx, tick_rx) = watch::channel(TickCommands::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let transmitter = Transmitter::new(
        &config,
        Box::new(CaptureRadio { sent: captured_tx }),
        tick_rx,
        Clock::new(),
    );
    let handle = tokio::spawn(transmitter.run(shutdown_rx));

    let (tick, frame) = motor_tick(10);
    tick_tx.send(tick.clone()).unwrap();

    let buffer = captured_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("no buffer reached the radio");
    assert_eq!(buffer, format!("{frame}{BUFFER_END}"));

    // an identical tick is arbitrated away: nothing else on the air
    let (repeat, _) = motor_tick(20);
    tick_tx.send(repeat).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(captured_rx.try_recv().is_err());

    let _ = shutdown_tx.send(true);
    let _ = handle.await;
}
