//! Process lifecycle: interrupt handling and orderly shutdown.
//!
//! ```ignore
//! let interrupted = register_interrupts()?;
//! let worker = spawn_transmitter(transmitter)?;
//!
//! wait_for_interrupt(&interrupted, &config.shutdown);
//! shared.request_terminate();
//! match join_with_grace(worker, &config.shutdown) {
//!     ShutdownOutcome::Finished(result) => result?,
//!     other => log::warn!("{:?}", other),
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::ShutdownConfig;

/// Registers SIGINT and SIGTERM to raise the returned flag.
pub fn register_interrupts() -> std::io::Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&interrupted))?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))?;
    Ok(interrupted)
}

/// Blocks until `flag` is raised, polling every `poll_ms`.
pub fn wait_for_interrupt(flag: &AtomicBool, config: &ShutdownConfig) {
    let poll = Duration::from_millis(u64::from(config.poll_ms.max(1)));
    while !flag.load(Ordering::Acquire) {
        thread::sleep(poll);
    }
    log::info!("interrupt received, shutting down");
}

/// How a worker ended during shutdown.
#[derive(Debug)]
pub enum ShutdownOutcome<T> {
    /// The worker returned within the grace period.
    Finished(T),
    /// The worker panicked.
    Panicked,
    /// The worker was still running when the grace period ran out.
    TimedOut(JoinHandle<T>),
}

/// Waits up to `grace_ms` for `handle` to finish.
///
/// Never blocks longer than the grace period plus one poll interval. A
/// worker that overruns is left running and handed back.
pub fn join_with_grace<T>(handle: JoinHandle<T>, config: &ShutdownConfig) -> ShutdownOutcome<T> {
    let deadline = Instant::now() + Duration::from_millis(u64::from(config.grace_ms));
    let poll = Duration::from_millis(u64::from(config.poll_ms.max(1)));

    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("worker still running after {} ms grace", config.grace_ms);
            return ShutdownOutcome::TimedOut(handle);
        }
        thread::sleep(poll);
    }

    match handle.join() {
        Ok(value) => ShutdownOutcome::Finished(value),
        Err(_) => {
            log::error!("worker panicked");
            ShutdownOutcome::Panicked
        }
    }
}
