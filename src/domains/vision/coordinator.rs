use super::{Detection, DetectionSnapshot, Detector, Frame, FrameSource};
use crate::config::VisionConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Raw worker output pushed into the shared mailbox.
struct DetectionResult {
    frame: Frame,
    detections: Vec<Detection>,
}

/// Dispatcher-side view of one detection worker.
struct WorkerSlot {
    /// Set by the worker itself: false while a detection is in flight.
    idle: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<Frame>,
}

/// Shared read handle onto the published snapshot. Cloning is cheap; reads
/// acquire only the snapshot lock, for the duration of a copy.
#[derive(Clone)]
pub struct SnapshotReader {
    snapshot: Arc<RwLock<DetectionSnapshot>>,
}

impl SnapshotReader {
    /// Copy of the newest published snapshot. Never blocks on detection
    /// work; repeated calls between publishes return the same value.
    pub async fn snapshot(&self) -> DetectionSnapshot {
        self.snapshot.read().await.clone()
    }
}

/// Concurrent vision pipeline: a dispatcher/collector task round-robins
/// frames over a fixed pool of detection workers and publishes the newest
/// consistent result.
///
/// Workers that are still busy are skipped rather than queued: a slow worker
/// simply detects less often and never accumulates a backlog. Results that
/// complete out of submission order are discarded when older than the last
/// accepted frame, so snapshot timestamps never regress.
pub struct VisionCoordinator {
    snapshot: Arc<RwLock<DetectionSnapshot>>,
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl VisionCoordinator {
    pub fn spawn<S: FrameSource>(
        source: S,
        detector: Arc<dyn Detector>,
        config: &VisionConfig,
    ) -> Self {
        let snapshot = Arc::new(RwLock::new(DetectionSnapshot::default()));
        let running = Arc::new(AtomicBool::new(true));
        let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();

        let mut handles = Vec::new();
        let mut slots = Vec::new();
        for worker in 0..config.workers.max(1) {
            let idle = Arc::new(AtomicBool::new(true));
            let (frame_tx, frame_rx) = mpsc::channel(1);
            handles.push(tokio::spawn(worker_loop(
                worker,
                frame_rx,
                idle.clone(),
                detector.clone(),
                mailbox_tx.clone(),
            )));
            slots.push(WorkerSlot { idle, frame_tx });
        }

        handles.push(tokio::spawn(dispatch_loop(
            source,
            slots,
            mailbox_rx,
            snapshot.clone(),
            running.clone(),
            config.dispatch_interval_ms,
        )));

        Self {
            snapshot,
            running,
            handles,
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            snapshot: self.snapshot.clone(),
        }
    }

    pub async fn snapshot(&self) -> DetectionSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Cooperative stop: the dispatcher observes the flag on its next tick,
    /// drops the worker channels and every task joins. In-flight detections
    /// finish and are discarded; nothing is aborted mid-operation.
    pub async fn shutdown(self) {
        self.running.store(false, Ordering::Release);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// One detection worker: waits for a frame, runs the detector, pushes the
/// result to the mailbox and flags itself idle again. An empty frame is
/// still reported, with an empty detection list.
async fn worker_loop(
    worker: usize,
    mut frame_rx: mpsc::Receiver<Frame>,
    idle: Arc<AtomicBool>,
    detector: Arc<dyn Detector>,
    mailbox_tx: mpsc::UnboundedSender<DetectionResult>,
) {
    while let Some(frame) = frame_rx.recv().await {
        idle.store(false, Ordering::Release);
        let detections = if frame.is_empty() {
            Vec::new()
        } else {
            detector.detect(&frame)
        };
        let _ = mailbox_tx.send(DetectionResult { frame, detections });
        idle.store(true, Ordering::Release);
    }
    debug!(worker, "detection worker stopped");
}

/// Dispatcher and collector, one task. Each tick hands the newest frame to
/// the next idle worker (round-robin over an explicit wrapped cursor) and
/// drains the mailbox into the published snapshot.
async fn dispatch_loop<S: FrameSource>(
    mut source: S,
    slots: Vec<WorkerSlot>,
    mut mailbox_rx: mpsc::UnboundedReceiver<DetectionResult>,
    snapshot: Arc<RwLock<DetectionSnapshot>>,
    running: Arc<AtomicBool>,
    dispatch_interval_ms: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(dispatch_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cursor = 0usize;
    let mut last_accepted = 0u64;

    while running.load(Ordering::Acquire) {
        ticker.tick().await;

        let slot = &slots[cursor];
        if slot.idle.load(Ordering::Acquire) {
            let frame = source.next_frame();
            if slot.frame_tx.try_send(frame).is_err() {
                trace!(worker = cursor, "hand-off raced a busy worker, skipped");
            }
        }
        cursor = (cursor + 1) % slots.len();

        while let Ok(result) = mailbox_rx.try_recv() {
            if result.frame.time_ms < last_accepted {
                trace!(
                    stale = result.frame.time_ms,
                    accepted = last_accepted,
                    "discarding out-of-order detection result"
                );
                continue;
            }
            last_accepted = result.frame.time_ms;
            *snapshot.write().await = DetectionSnapshot {
                frame: result.frame,
                detections: result.detections,
            };
        }
    }
    debug!("vision dispatcher stopped");
}
