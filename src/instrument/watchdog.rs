//! Stuck-call watchdog.
//!
//! # Data Flow
//! ```text
//! FuncTimer::start
//!     → Watchdog::spawn (task on the dedicated watchdog runtime)
//!     → race: completion signal  vs  now + threshold
//!         completion first → exit silently
//!         threshold first  → on_stuck(elapsed), exit
//! ```
//!
//! # Design Decisions
//! - Watchdogs run on their own runtime thread, never on the caller's
//!   executor: blocking work on a current-thread runtime (or on every
//!   worker of a multi-thread one) can't starve them
//! - Never cancels the watched work, it only reports on it
//! - Dropping the handle counts as completion, so a watchdog can't outlive
//!   its timer past the threshold
//! - Deadlines are wall-clock, independent of a caller's paused test clock

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;

/// Handle that stops a running watchdog.
#[derive(Debug)]
pub(crate) enum Watchdog {
    Armed(oneshot::Sender<()>),
    Detached,
}

fn watchdog_runtime() -> Option<&'static Handle> {
    static RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("statter-watchdog")
                .enable_time()
                .build()
                .map_err(|e| {
                    tracing::warn!(error = %e, "Failed to start watchdog runtime, stuck detection off");
                })
                .ok()
        })
        .as_ref()
        .map(Runtime::handle)
}

impl Watchdog {
    /// Spawn a watchdog that calls `on_stuck` once `threshold` has passed,
    /// unless disarmed first.
    pub(crate) fn spawn<F>(threshold: Duration, on_stuck: F) -> Self
    where
        F: FnOnce(Duration) + Send + 'static,
    {
        let Some(handle) = watchdog_runtime() else {
            return Watchdog::Detached;
        };

        let start = Instant::now();
        let (tx, rx) = oneshot::channel::<()>();
        handle.spawn(async move {
            let deadline = tokio::time::Instant::from_std(start + threshold);
            tokio::select! {
                biased;
                _ = rx => {}
                _ = tokio::time::sleep_until(deadline) => on_stuck(start.elapsed()),
            }
        });
        Watchdog::Armed(tx)
    }

    /// Signal completion. The watchdog exits without reporting.
    pub(crate) fn disarm(self) {
        if let Watchdog::Armed(tx) = self {
            let _ = tx.send(());
        }
    }
}
