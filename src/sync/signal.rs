//! One-shot broadcastable completion signal.
//!
//! A watcher announces "I am finished" by setting its signal exactly once,
//! optionally with an error. Any number of observers can await or poll it;
//! the error is readable after completion.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::domain::error::WatchError;

#[derive(Debug)]
struct SignalInner {
    tx: watch::Sender<bool>,
    error: Mutex<Option<WatchError>>,
}

/// A single-assignment completion event with an optional error payload.
///
/// Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct Signal {
    inner: std::sync::Arc<SignalInner>,
}

impl Signal {
    /// A new, unset signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            inner: std::sync::Arc::new(SignalInner {
                tx,
                error: Mutex::new(None),
            }),
        }
    }

    fn error_slot(&self) -> MutexGuard<'_, Option<WatchError>> {
        self.inner.error.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the signal with no error. Returns `true` if this call set it;
    /// later calls are no-ops.
    pub fn signal(&self) -> bool {
        self.signal_with(None)
    }

    /// Set the signal carrying `error`. First set wins.
    pub fn signal_with_error(&self, error: WatchError) -> bool {
        self.signal_with(Some(error))
    }

    fn signal_with(&self, error: Option<WatchError>) -> bool {
        let mut slot = self.error_slot();
        let mut first = false;
        self.inner.tx.send_if_modified(|done| {
            if *done {
                return false;
            }
            *done = true;
            first = true;
            true
        });
        if first {
            *slot = error;
        }
        first
    }

    /// Whether the signal has been set.
    pub fn is_done(&self) -> bool {
        *self.inner.tx.borrow()
    }

    /// The error carried by the signal, if any. `None` until set.
    pub fn error(&self) -> Option<WatchError> {
        if !self.is_done() {
            return None;
        }
        self.error_slot().clone()
    }

    /// Wait until the signal is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.inner.tx.subscribe();
        // wait_for returns immediately when the current value already matches.
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
