//! Shared control state for a controller's threads.
//!
//! `SharedControlState` holds the fields that button callbacks, the worker
//! and the main thread all touch: one value (the beacon's message selection
//! or the thermostat's set point), a mirror of the automaton's current state,
//! and the termination flag.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_blinkz::services::SharedControlState;
//! use rs_blinkz::thermostat::ThermostatState;
//!
//! let state = Arc::new(SharedControlState::new(72, ThermostatState::Off));
//!
//! // Button callback side
//! state.with_value(|set_point| *set_point += 1);
//!
//! // Worker side
//! assert_eq!(state.value(), 73);
//! assert!(!state.is_terminated());
//!
//! // Main thread on shutdown
//! state.request_terminate();
//! assert!(state.is_terminated());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// A panicking button callback must not wedge the worker, and every field
/// guarded here is valid after any partial update.
pub(crate) fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe holder for one controller's mutable fields.
///
/// # Thread Safety
///
/// - The value and the state mirror each sit behind their own `Mutex`, so a
///   reader sees either the old or the new value, never a partial write.
/// - `terminate` is an `AtomicBool` with release/acquire ordering: once the
///   main thread sets it, the worker's next poll observes it.
pub struct SharedControlState<V, S> {
    value: Mutex<V>,
    state: Mutex<S>,
    terminate: AtomicBool,
}

impl<V, S: Copy> SharedControlState<V, S> {
    /// Creates the shared state.
    pub fn new(value: V, state: S) -> Self {
        Self {
            value: Mutex::new(value),
            state: Mutex::new(state),
            terminate: AtomicBool::new(false),
        }
    }

    /// Runs `f` with exclusive access to the value.
    ///
    /// Keep the closure short; every other reader waits on it.
    pub fn with_value<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut guard = lock_recovering(&self.value);
        f(&mut *guard)
    }

    /// Replaces the value.
    pub fn set_value(&self, value: V) {
        *lock_recovering(&self.value) = value;
    }

    /// Last state reported by the automaton's owner.
    pub fn current_state(&self) -> S {
        *lock_recovering(&self.state)
    }

    /// Records the automaton's state after a transition.
    pub fn set_current_state(&self, state: S) {
        *lock_recovering(&self.state) = state;
    }

    /// Asks every loop sharing this state to stop at its next poll point.
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    /// Returns true once termination was requested.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }
}

impl<V: Clone, S: Copy> SharedControlState<V, S> {
    /// Snapshot of the value.
    pub fn value(&self) -> V {
        lock_recovering(&self.value).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    // ========================================================================
    // Basic access
    // ========================================================================

    #[test]
    fn value_round_trips() {
        let state = SharedControlState::new(10, 'a');
        state.set_value(11);
        assert_eq!(state.value(), 11);
        assert_eq!(state.with_value(|v| *v * 2), 22);
    }

    #[test]
    fn state_mirror() {
        let state = SharedControlState::new((), 'a');
        assert_eq!(state.current_state(), 'a');
        state.set_current_state('b');
        assert_eq!(state.current_state(), 'b');
    }

    #[test]
    fn terminate_is_sticky() {
        let state = SharedControlState::new((), ());
        assert!(!state.is_terminated());
        state.request_terminate();
        state.request_terminate();
        assert!(state.is_terminated());
    }

    // ========================================================================
    // Concurrency
    // ========================================================================

    #[test]
    fn poisoned_value_is_recovered() {
        let state = Arc::new(SharedControlState::new(5, ()));
        let panicker = Arc::clone(&state);
        let result = thread::spawn(move || {
            panicker.with_value(|v| {
                *v = 6;
                panic!("callback bug");
            })
        })
        .join();
        assert!(result.is_err());

        // Still readable and writable
        assert_eq!(state.value(), 6);
        state.set_value(7);
        assert_eq!(state.value(), 7);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let state = Arc::new(SharedControlState::new(0u32, ()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for _ in 0..250 {
                        state.with_value(|v| *v += 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(state.value(), 1000);
    }

    #[test]
    fn terminate_visible_across_threads() {
        let state = Arc::new(SharedControlState::new((), ()));
        let worker_state = Arc::clone(&state);
        let worker = thread::spawn(move || {
            while !worker_state.is_terminated() {
                thread::yield_now();
            }
        });
        state.request_terminate();
        worker.join().unwrap();
    }
}
