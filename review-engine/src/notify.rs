//! Edge-triggered wake signals for long-polls and the push channel.
//!
//! One gate per review plus one global gate. A gate is a latch over
//! `tokio::sync::Notify`: `emit` sets the latch and wakes current waiters;
//! a waiter that arrives after an emit consumes the latch and returns
//! immediately, so the emit-before-wait race loses no wakeups. Entries are
//! created lazily (by either side) and dropped when a review closes;
//! in-flight waiters keep their own `Arc` and simply time out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

/// Long-poll budget: strictly under the ~30 s client-side RPC timeout.
pub const LONG_POLL: Duration = Duration::from_secs(25);

/// How a bounded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Fired,
    TimedOut,
}

#[derive(Default)]
struct Gate {
    notify: Notify,
    dirty: AtomicBool,
}

impl Gate {
    fn emit(&self) {
        self.dirty.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    async fn wait(&self, timeout: Duration) -> WaitOutcome {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register interest before checking the latch, otherwise an emit
        // landing between the check and the await would be lost.
        notified.as_mut().enable();

        if self.dirty.swap(false, Ordering::AcqRel) {
            return WaitOutcome::Fired;
        }

        match tokio::time::timeout(timeout, notified).await {
            Ok(()) => {
                self.dirty.swap(false, Ordering::AcqRel);
                WaitOutcome::Fired
            }
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

/// Process-local notification bus.
#[derive(Default)]
pub struct ReviewSignals {
    per_review: Mutex<HashMap<String, Arc<Gate>>>,
    global: Gate,
}

impl ReviewSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire-and-forget: wakes waiters on this review and on the global gate.
    /// Call only after the corresponding transaction has committed.
    pub fn emit(&self, review_id: &str) {
        self.gate_for(review_id).emit();
        self.global.emit();
    }

    /// Blocks until the review's gate fires or `timeout` elapses.
    pub async fn wait(&self, review_id: &str, timeout: Duration) -> WaitOutcome {
        let gate = self.gate_for(review_id);
        gate.wait(timeout).await
    }

    /// Blocks until any review changes or `timeout` elapses.
    pub async fn wait_any(&self, timeout: Duration) -> WaitOutcome {
        self.global.wait(timeout).await
    }

    /// Frees the per-review entry once a review is closed.
    pub fn cleanup(&self, review_id: &str) {
        self.per_review
            .lock()
            .expect("signal map lock poisoned")
            .remove(review_id);
    }

    fn gate_for(&self, review_id: &str) -> Arc<Gate> {
        let mut map = self.per_review.lock().expect("signal map lock poisoned");
        map.entry(review_id.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_before_wait_is_not_lost() {
        let signals = ReviewSignals::new();
        signals.emit("r1");
        let outcome = signals.wait("r1", Duration::from_millis(10)).await;
        assert_eq!(outcome, WaitOutcome::Fired);
        // Latch was consumed; the next wait times out.
        let outcome = signals.wait("r1", Duration::from_millis(10)).await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[tokio::test]
    async fn waiter_wakes_on_emit() {
        let signals = Arc::new(ReviewSignals::new());
        let waiter = {
            let signals = signals.clone();
            tokio::spawn(async move { signals.wait("r2", Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        signals.emit("r2");
        assert_eq!(waiter.await.unwrap(), WaitOutcome::Fired);
    }

    #[tokio::test]
    async fn global_gate_sees_every_emit() {
        let signals = Arc::new(ReviewSignals::new());
        let waiter = {
            let signals = signals.clone();
            tokio::spawn(async move { signals.wait_any(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        signals.emit("whatever");
        assert_eq!(waiter.await.unwrap(), WaitOutcome::Fired);
    }

    #[tokio::test]
    async fn cleanup_leaves_waiters_to_time_out() {
        let signals = Arc::new(ReviewSignals::new());
        let waiter = {
            let signals = signals.clone();
            tokio::spawn(async move { signals.wait("r3", Duration::from_millis(50)).await })
        };
        signals.cleanup("r3");
        assert_eq!(waiter.await.unwrap(), WaitOutcome::TimedOut);
    }
}
