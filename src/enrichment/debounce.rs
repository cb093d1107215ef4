//! Debounced URL intake for Handymarks.
//!
//! Coalesces a burst of rapid URL-field edits into a single enrichment
//! trigger after a quiet period. Implemented as an explicit timer-reset
//! primitive over a plain channel — one logical timer per input stream,
//! reset on every submission, with only the most recent value surviving.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Debounces URL input events.
///
/// Dropping (or calling [`shutdown`](Self::shutdown) on) the debouncer
/// aborts the worker task as a unit: a pending emission that has not yet
/// fired is cancelled and nothing is delivered after teardown.
pub struct UrlDebouncer {
    tx: mpsc::UnboundedSender<String>,
    worker: JoinHandle<()>,
}

impl UrlDebouncer {
    /// Spawns a debouncer with the given quiet period. Returns the handle
    /// used to submit raw input and the receiver that yields at most one
    /// value per quiet window — always the latest submission, and never
    /// the same value twice in a row.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let (out_tx, out_rx) = mpsc::channel::<String>(16);

        let worker = tokio::spawn(run_debounce(rx, out_tx, quiet));

        (Self { tx, worker }, out_rx)
    }

    /// Feeds one input event. Each submission resets the quiet-period
    /// timer. Returns `false` if the debouncer has been shut down.
    pub fn submit(&self, value: impl Into<String>) -> bool {
        self.tx.send(value.into()).is_ok()
    }

    /// Tears the debouncer down, cancelling any pending emission.
    pub fn shutdown(&self) {
        self.worker.abort();
    }
}

impl Drop for UrlDebouncer {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_debounce(
    mut rx: mpsc::UnboundedReceiver<String>,
    out_tx: mpsc::Sender<String>,
    quiet: Duration,
) {
    let mut pending: Option<String> = None;
    let mut last_emitted: Option<String> = None;

    loop {
        if pending.is_none() {
            // Idle: wait for the next input
            match rx.recv().await {
                Some(value) => pending = Some(value),
                None => return,
            }
            continue;
        }

        // Armed: a newer input resets the timer, silence fires the trigger
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(value) => pending = Some(value),
                None => return,
            },
            _ = sleep(quiet) => {
                match pending.take() {
                    Some(value) if last_emitted.as_deref() != Some(value.as_str()) => {
                        debug!(url = %value, "debounce fired");
                        if out_tx.send(value.clone()).await.is_err() {
                            return;
                        }
                        last_emitted = Some(value);
                    }
                    Some(value) => {
                        debug!(url = %value, "debounce suppressed duplicate");
                    }
                    None => {}
                }
            }
        }
    }
}
