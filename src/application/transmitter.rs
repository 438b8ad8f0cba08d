use crate::common::Clock;
use crate::config::Config;
use crate::domains::radio::{CommandArbiter, RadioChannel, TickCommands};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Drains decision-loop ticks to the radio link.
///
/// Ticks arrive through a watch channel, so an undelivered bundle is always
/// overwritten by a newer one; the link never works through a backlog. The
/// arbiter decides per robot what actually needs the air.
pub struct Transmitter {
    arbiter: CommandArbiter,
    radio: Box<dyn RadioChannel>,
    tick_rx: watch::Receiver<TickCommands>,
    clock: Clock,
    log_interval_ms: u64,
    last_log_ms: u64,
}

impl Transmitter {
    pub fn new(
        config: &Config,
        radio: Box<dyn RadioChannel>,
        tick_rx: watch::Receiver<TickCommands>,
        clock: Clock,
    ) -> Self {
        Self {
            arbiter: CommandArbiter::new(&config.radio),
            radio,
            tick_rx,
            clock,
            log_interval_ms: config.radio.log_interval_ms,
            last_log_ms: 0,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                res = self.tick_rx.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }

            let tick = self.tick_rx.borrow_and_update().clone();
            if tick.time_ms == 0 {
                // the channel's initial value, not a real tick
                continue;
            }
            let now = self.clock.now_ms();

            if let Some(buffer) = self.arbiter.assemble(&tick.commands, now) {
                self.log_buffer(&buffer, now);
                if let Err(err) = self.radio.send(buffer.as_bytes()) {
                    // the next tick retries; only the stop-all path is capped
                    warn!(%err, "radio send failed");
                }
            }
            self.arbiter.prune(&tick.tracked);
        }

        self.radio.close();
        debug!("transmitter stopped");
    }

    /// Rate-limited buffer logging, so a chatty tick rate cannot swamp the
    /// log output.
    fn log_buffer(&mut self, buffer: &str, now_ms: u64) {
        if now_ms.saturating_sub(self.last_log_ms) <= self.log_interval_ms && self.last_log_ms != 0
        {
            return;
        }
        self.last_log_ms = now_ms;
        debug!(%buffer, "radio buffer");
    }
}
