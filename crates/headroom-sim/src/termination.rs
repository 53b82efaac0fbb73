//! Exactly-once run termination.
//!
//! Two independent callback contexts, the bind interceptor (acceptance
//! limit) and the rejection watcher, can race to stop the same run, and a
//! caller can abort it externally on top of that. `TerminationState` makes
//! "signal already sent" a checked state transition instead of a fault:
//! the underlying watch channel is written at most once, whichever context
//! wins.

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Terminating,
    Terminated,
}

/// Single-fire termination signal shared by the run's tasks.
///
/// The same watch channel both unblocks the initiating task and cancels the
/// engine and watcher tasks, so releasing the background work is inherently
/// at-most-once.
pub struct TerminationState {
    phase: Mutex<Phase>,
    signal: watch::Sender<bool>,
}

impl TerminationState {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            phase: Mutex::new(Phase::Active),
            signal,
        }
    }

    /// Transition to terminated and fire the signal.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// every later (or concurrently losing) call is a no-op.
    pub fn fire(&self) -> bool {
        let mut phase = self
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *phase != Phase::Active {
            return false;
        }
        *phase = Phase::Terminating;
        // send_replace stores the value even with no receiver around, so a
        // fire before anyone subscribes is still observed later.
        self.signal.send_replace(true);
        *phase = Phase::Terminated;
        true
    }

    /// Whether termination has begun (or completed).
    pub fn begun(&self) -> bool {
        *self
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            != Phase::Active
    }

    /// Receiver usable as a task shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }

    /// Block until the signal fires. Returns immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.signal.subscribe();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}

impl Default for TerminationState {
    fn default() -> Self {
        Self::new()
    }
}
