use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodic tick counter driving re-evaluation of estimates. The task is
/// aborted when the clock is stopped or dropped.
pub struct RefreshClock {
    ticks: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl RefreshClock {
    pub fn start(period: Duration) -> Self {
        let (sender, ticks) = watch::channel(0u64);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                sender.send_modify(|tick| *tick += 1);
                tracing::trace!("Refresh tick {}", *sender.borrow());
            }
        });

        Self { ticks, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks.clone()
    }

    pub fn current(&self) -> u64 {
        *self.ticks.borrow()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for RefreshClock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
