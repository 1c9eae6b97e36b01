//! Generic thread-safe FIFO ready queue.
//!
//! Watchers push exactly one terminal result here; the consuming report
//! manager pulls on its own schedule.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

#[derive(Debug)]
struct QueueInner<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
}

/// A cloneable FIFO sink.
#[derive(Debug)]
pub struct ReadyQueue<T> {
    inner: Arc<QueueInner<T>>,
}

impl<T> Clone for ReadyQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ReadyQueue<T> {
    /// An empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                items: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
            }),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.inner.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item at the back.
    pub fn push(&self, item: T) {
        self.items().push_back(item);
        self.inner.notify.notify_one();
    }

    /// Remove and return the front item, if any.
    pub fn pull(&self) -> Option<T> {
        self.items().pop_front()
    }

    /// Wait until an item is available, then remove and return it.
    pub async fn pull_wait(&self) -> T {
        loop {
            // Register before checking to avoid missing a push in between.
            let notified = self.inner.notify.notified();
            if let Some(item) = self.pull() {
                return item;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

impl<T> Default for ReadyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
