//! Scheduled tasks keyed by the preference value they depend on
//!
//! A `KeyedTask` runs at most one task at a time. Re-arming with a different
//! key cancels the running task (and waits for it to stop) before spawning
//! the replacement, so two generations never race on the same state.

use std::fmt::Debug;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct KeyedTask<K> {
    name: &'static str,
    key: Option<K>,
    handle: Option<JoinHandle<()>>,
}

impl<K: Copy + PartialEq + Debug> KeyedTask<K> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            handle: None,
        }
    }

    pub fn key(&self) -> Option<K> {
        self.key
    }

    /// Spawn `make(key)` unless a task for the same key is already running.
    /// Returns whether a new task was started.
    pub async fn rearm<F, Fut>(&mut self, key: K, make: F) -> bool
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let running = self.handle.as_ref().is_some_and(|h| !h.is_finished());
        if running && self.key == Some(key) {
            return false;
        }
        self.cancel().await;
        debug!(task = self.name, key = ?key, "Arming scheduled task");
        self.key = Some(key);
        self.handle = Some(tokio::spawn(make(key)));
        true
    }

    /// Abort the running task and wait until it has stopped
    pub async fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation error is the expected outcome
            let _ = handle.await;
            debug!(task = self.name, key = ?self.key, "Cancelled scheduled task");
        }
        self.key = None;
    }
}

impl<K> Drop for KeyedTask<K> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
