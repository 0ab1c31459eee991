//! Cooperative cancellation signal.
//!
//! The concurrency model requires cancellation to reach every suspension
//! point a public operation can hit — DNS resolution, connect, body read,
//! backoff sleep, coalescing wait — not just the outer state machine, or a
//! slow server could hold a task alive past the caller's deadline. This is
//! a thin wrapper over `tokio::sync::watch`, matching the teacher's existing
//! preference for `tokio::sync` primitives over hand-rolled signaling.

use std::future::Future;

use tokio::sync::watch;

/// The caller-held half. Dropping it without calling [`cancel`] leaves the
/// operation to run to completion normally.
///
/// [`cancel`]: CancellationSignal::cancel
#[derive(Clone, Debug)]
pub struct CancellationSignal {
    tx: watch::Sender<bool>,
}

/// The callee-held half, threaded through the fetcher and orchestrator.
#[derive(Clone, Debug)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn new() -> (Self, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, Cancellation { rx })
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new().0
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::none()
    }
}

impl Cancellation {
    /// A signal that never fires, for callers that didn't supply one.
    pub fn none() -> Self {
        CancellationSignal::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Races `fut` against cancellation. Returns `None` if cancellation
    /// won the race; the future is dropped in that case, which is how
    /// cancellation reaches `tokio::time::sleep` and in-flight reads.
    pub async fn race<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return None;
        }
        let mut rx = self.rx.clone();
        tokio::select! {
            biased;
            result = fut => Some(result),
            _ = wait_for_true(&mut rx) => None,
        }
    }
}

async fn wait_for_true(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
