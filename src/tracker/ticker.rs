use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::utils::clock::Clock;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed period of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Handle to the periodic tick task. The task lives exactly as long as this handle: dropping it
/// cancels the schedule, whichever way the owner goes out of scope.
pub struct Ticker {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Starts emitting a [Tick] every `period` into `sender`. Ticks are scheduled against
    /// absolute instants so a slow consumer doesn't make the countdown drift.
    pub fn spawn(sender: mpsc::Sender<Tick>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_ticks(sender, clock, period, shutdown.clone()));
        debug!("Tick schedule started");
        Self { shutdown, handle }
    }

    pub fn cancel(self) {
        drop(self)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown.cancel();
        debug!("Tick schedule cancelled");
    }
}

async fn run_ticks(
    sender: mpsc::Sender<Tick>,
    clock: Arc<dyn Clock>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut next_tick = clock.instant();
    loop {
        next_tick += period;

        tokio::select! {
            // A cancelled ticker must never deliver another tick, so cancellation wins ties.
            biased;
            _ = shutdown.cancelled() => {
                return;
            }
            _ = clock.sleep_until(next_tick) => ()
        }

        trace!("Sending tick");
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                return;
            }
            sent = sender.send(Tick) => {
                if sent.is_err() {
                    // receiver is gone, nobody is counting anymore
                    return;
                }
            }
        }
    }
}
