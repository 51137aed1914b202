//! Background eviction of expired sessions.
//!
//! `authorize` already rejects expired sessions lazily; the sweeper keeps the
//! table from accumulating sessions nobody comes back for.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::auth::gate::AccessGate;

pub struct SessionSweeper {
    gate: Arc<AccessGate>,
}

impl SessionSweeper {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }

    /// Sweep on every tick until shutdown. The interval is re-read from the
    /// gate's policy after each sweep, so reloads take effect.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut period = self.gate.policy().sweep_interval();
        tracing::info!(interval = ?period, "Session sweeper starting");

        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.gate.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, "Swept sessions");
                    }

                    let configured = self.gate.policy().sweep_interval();
                    if configured != period {
                        period = configured;
                        ticker = time::interval_at(time::Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
