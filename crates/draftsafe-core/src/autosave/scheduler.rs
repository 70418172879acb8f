//! Per-key auto-save timers.
//!
//! Each armed key owns one tokio task that sleeps for the key's interval and
//! then runs the tick callback. Resetting a key restarts its sleep, so the
//! next tick is measured from the reset rather than from the previous tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::storage::BoxFuture;

/// Work run on every tick of a key's timer.
pub type TickFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct Timer {
    reset: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One timer per registered key.
#[derive(Default)]
pub struct Scheduler {
    timers: Mutex<HashMap<String, Timer>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer for `key`.
    ///
    /// Returns `false` when called outside a tokio runtime; the key then has
    /// no timer.
    pub fn arm(&self, key: &str, interval: Duration, tick: TickFn) -> bool {
        let Ok(handle) = Handle::try_current() else {
            self.cancel(key);
            return false;
        };

        let reset = Arc::new(Notify::new());
        let task = handle.spawn(run_timer(interval, Arc::clone(&reset), tick));

        // Replacing drops (and aborts) any previous timer for the key.
        self.lock().insert(key.to_string(), Timer { reset, task });
        true
    }

    /// Restart the sleep of `key`'s timer.
    pub fn reset(&self, key: &str) {
        if let Some(timer) = self.lock().get(key) {
            timer.reset.notify_one();
        }
    }

    pub fn cancel(&self, key: &str) {
        // Abort happens in Timer::drop, outside the lock.
        let removed = self.lock().remove(key);
        drop(removed);
    }

    pub fn cancel_all(&self) {
        let timers: Vec<Timer> = self.lock().drain().map(|(_, timer)| timer).collect();
        drop(timers);
    }

    pub fn is_armed(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Timer>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn run_timer(interval: Duration, reset: Arc<Notify>, tick: TickFn) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(interval) => tick().await,
            () = reset.notified() => {}
        }
    }
}
