//! Debounce scheduler
//!
//! Collapses a burst of changes into one trigger. A single long-lived task owns
//! the timer; every forwarded change sends a touch over a channel, which pushes
//! the deadline to `now + quiet`. The trigger fires once when the deadline
//! passes with no further touch, then the task goes idle until the next touch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Handle to the debounce task
///
/// Dropping every handle closes the channel and stops the task; a window still
/// pending at that point is discarded.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    fired: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Spawn the debounce task on the current runtime
    ///
    /// `on_fire` runs on the debounce task; it should hand work off (for
    /// example by spawning) rather than block.
    pub fn spawn<F>(quiet: Duration, on_fire: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let fired = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run(quiet, rx, Arc::clone(&fired), on_fire));
        Self { tx, fired, task }
    }

    /// Open a window, or extend the open one
    pub fn touch(&self) {
        // Only fails once the task has stopped
        let _ = self.tx.send(());
    }

    /// Number of windows that have fired
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    /// Close the channel and wait for the task to finish
    pub async fn shutdown(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        let _ = task.await;
    }
}

async fn run<F>(
    quiet: Duration,
    mut rx: mpsc::UnboundedReceiver<()>,
    fired: Arc<AtomicU64>,
    mut on_fire: F,
) where
    F: FnMut(),
{
    // Idle until the first change of a window
    while rx.recv().await.is_some() {
        let timer = sleep(quiet);
        tokio::pin!(timer);
        let mut extended = 0u32;

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(()) => {
                        extended += 1;
                        timer.as_mut().reset(Instant::now() + quiet);
                    }
                    None => {
                        debug!("Debounce channel closed, dropping pending window");
                        return;
                    }
                },
                () = &mut timer => {
                    debug!("Quiet period elapsed after {} extension(s)", extended);
                    fired.fetch_add(1, Ordering::SeqCst);
                    on_fire();
                    break;
                }
            }
        }
    }
}
