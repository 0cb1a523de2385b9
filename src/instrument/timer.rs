//! Per-invocation timing guards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::watchdog::Watchdog;
use super::{emit_func_counter, emit_func_timing, FUNC_ERROR};
use crate::client::{ClientState, Registry};
use crate::observability::ActiveSpan;
use crate::tags::Tags;

pub(crate) type SpanSlot = Arc<Mutex<Option<Box<dyn ActiveSpan>>>>;

/// Ends the span in `slot` if nobody has yet. Returns whether this call did.
pub(crate) fn end_span(slot: &SpanSlot, error: Option<&str>) -> bool {
    let span = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    match span {
        Some(mut span) => {
            if let Some(message) = error {
                span.set_error(message);
            }
            span.end();
            true
        }
        None => false,
    }
}

struct Running {
    registry: Registry,
    state: Arc<ClientState>,
    name: String,
    tags: Tags,
    start: Instant,
    watchdog: Mutex<Option<Watchdog>>,
    span: SpanSlot,
    stopped: AtomicBool,
}

/// Timing context of one instrumented invocation.
///
/// Created by [`Registry::func_timing`] and friends. The first `stop` reports
/// `func.timing`, later calls do nothing. Dropping an unstopped timer stops
/// it, so a timer bound with `let _timer = ...` covers the rest of the scope.
///
/// Reports go to the client that was active at start. When that client has
/// been replaced or closed by the time the timer stops, nothing is reported.
#[must_use = "the call is timed until this guard is stopped or dropped"]
pub struct FuncTimer {
    running: Option<Running>,
}

impl FuncTimer {
    pub(crate) fn inert() -> Self {
        Self { running: None }
    }

    pub(crate) fn start(
        registry: Registry,
        state: Arc<ClientState>,
        name: String,
        tags: Tags,
        start: Instant,
        watchdog: Watchdog,
        span: SpanSlot,
    ) -> Self {
        Self {
            running: Some(Running {
                registry,
                state,
                name,
                tags,
                start,
                watchdog: Mutex::new(Some(watchdog)),
                span,
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// True when no client was active at start; stopping reports nothing.
    pub fn is_inert(&self) -> bool {
        self.running.is_none()
    }

    pub fn is_stopped(&self) -> bool {
        self.running
            .as_ref()
            .map_or(true, |running| running.stopped.load(Ordering::Acquire))
    }

    /// Time since start. Zero for inert timers.
    pub fn elapsed(&self) -> Duration {
        self.running
            .as_ref()
            .map_or(Duration::ZERO, |running| running.start.elapsed())
    }

    pub fn stop(&self) {
        self.stop_with(&Tags::new());
    }

    /// Stop with extra tags merged over the start tags.
    pub fn stop_with(&self, stop_tags: &Tags) {
        let Some(running) = &self.running else {
            return;
        };
        if running.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let elapsed = running.start.elapsed();
        if let Some(watchdog) = lock(&running.watchdog).take() {
            watchdog.disarm();
        }

        if let Some(running) = self.still_current() {
            let tags = running.tags.merged(stop_tags);
            emit_func_timing(&running.state, &running.name, elapsed, &tags);
        }
        end_span(&running.span, None);
    }

    fn still_current(&self) -> Option<&Running> {
        self.running
            .as_ref()
            .filter(|running| running.registry.is_current(&running.state))
    }
}

impl Drop for FuncTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for FuncTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.running {
            Some(running) => f
                .debug_struct("FuncTimer")
                .field("name", &running.name)
                .field("tags", &running.tags)
                .field("stopped", &running.stopped.load(Ordering::Relaxed))
                .finish(),
            None => f.write_str("FuncTimer(inert)"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Called-and-timed invocation that also reports its outcome.
///
/// Finishing consumes the guard. Dropping it unfinished still reports the
/// timing, but never an error.
#[must_use = "finish the call with its result to report errors"]
#[derive(Debug)]
pub struct FuncCall {
    timer: FuncTimer,
}

impl FuncCall {
    pub(crate) fn new(timer: FuncTimer) -> Self {
        Self { timer }
    }

    pub fn timer(&self) -> &FuncTimer {
        &self.timer
    }

    pub fn finish<T, E>(self, result: &Result<T, E>) {
        self.finish_with(result, &Tags::new());
    }

    /// Report timing with `stop_tags`, then `func.error` if `result` is an error.
    pub fn finish_with<T, E>(self, result: &Result<T, E>, stop_tags: &Tags) {
        self.timer.stop_with(stop_tags);
        if result.is_err() {
            if let Some(running) = self.timer.still_current() {
                let tags = running.tags.merged(stop_tags);
                emit_func_counter(&running.state, FUNC_ERROR, &running.name, &tags);
            }
        }
    }
}
