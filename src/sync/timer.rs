//! Resettable deadline timer abstraction.
//!
//! The watcher loops own their timer through this trait so tests can drive
//! the deadline manually without real time passing.

use std::future::pending;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant, Sleep};

/// Fire-once deadline that can be restarted to its full duration.
///
/// `fired` must be cancellation safe: the watcher loops poll it inside
/// `select!` alongside their message channels.
pub trait Timer: Send {
    /// Resolves when the deadline fires. Never resolves after [`Timer::stop`].
    fn fired(&mut self) -> impl std::future::Future<Output = ()> + Send;

    /// Restart the deadline to the full duration.
    fn reset(&mut self);

    /// Release the timer's resources. The deadline never fires afterwards.
    fn stop(&mut self);
}

/// Production timer over `tokio::time::sleep_until`.
#[derive(Debug)]
pub struct DeadlineTimer {
    duration: Duration,
    sleep: Pin<Box<Sleep>>,
    stopped: bool,
}

impl DeadlineTimer {
    /// A timer firing `duration` from now.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            sleep: Box::pin(sleep_until(Instant::now() + duration)),
            stopped: false,
        }
    }
}

impl Timer for DeadlineTimer {
    async fn fired(&mut self) {
        if self.stopped {
            pending::<()>().await;
        }
        self.sleep.as_mut().await;
    }

    fn reset(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + self.duration);
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Manually driven timer for deterministic tests.
///
/// The deadline fires when [`ManualTimerHandle::fire`] is called; resets and
/// stops are only recorded so tests can assert on them.
#[derive(Debug)]
pub struct ManualTimer {
    fire_rx: mpsc::UnboundedReceiver<()>,
    resets: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

/// Test-side handle driving a [`ManualTimer`].
#[derive(Debug, Clone)]
pub struct ManualTimerHandle {
    fire_tx: mpsc::UnboundedSender<()>,
    resets: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl ManualTimer {
    /// A manual timer and the handle that drives it.
    pub fn new() -> (Self, ManualTimerHandle) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        let resets = Arc::new(AtomicUsize::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        (
            Self {
                fire_rx,
                resets: Arc::clone(&resets),
                stopped: Arc::clone(&stopped),
            },
            ManualTimerHandle {
                fire_tx,
                resets,
                stopped,
            },
        )
    }
}

impl Timer for ManualTimer {
    async fn fired(&mut self) {
        if self.stopped.load(Ordering::Acquire) {
            pending::<()>().await;
        }
        if self.fire_rx.recv().await.is_none() {
            // Handle dropped without firing: behave like a stopped timer.
            pending::<()>().await;
        }
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::AcqRel);
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

impl ManualTimerHandle {
    /// Make the timer's deadline fire once.
    pub fn fire(&self) {
        let _ = self.fire_tx.send(());
    }

    /// How many times the owning loop reset the deadline.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::Acquire)
    }

    /// Whether the owning loop stopped the timer.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
