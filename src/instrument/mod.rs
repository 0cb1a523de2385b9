//! Function instrumentation engine.
//!
//! # Responsibilities
//! - Count calls, errors and statuses of named functions
//! - Time invocations and flag the ones running past the stuck threshold
//! - Optionally wrap each timed invocation in a tracing span
//!
//! # Invocation Lifecycle
//! ```text
//! func_call_and_timing_with_err(name, tags)
//!     → func.called            (immediately, sampled)
//!     → FuncTimer + watchdog   (Started → Running)
//!         threshold elapses    → func.stuck, span errored and ended
//!     → finish(&result)
//!         → func.timing        (always, exactly once)
//!         → func.error         (only for Err)
//! ```
//!
//! # Design Decisions
//! - Nothing here can fail the instrumented call: delivery errors are logged
//! - An inactive registry yields inert guards and spawns no watchdog
//! - `func_name` is always the last tag and can't be overridden by callers
//! - A timer reports to the client that was active when it started. If that
//!   client was replaced or closed meanwhile, the timing, stuck and error
//!   reports of the call are dropped
//! - Names are passed explicitly or resolved at compile time with
//!   [`func_name!`](crate::func_name)

mod name;
mod timer;
mod watchdog;

pub use name::{short_func_name, type_name_of};
pub use timer::{FuncCall, FuncTimer};

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::client::{ClientState, Registry};
use crate::sink::swallow;
use crate::tags::Tags;
use timer::{end_span, SpanSlot};
use watchdog::Watchdog;

/// Sample rate of the `func.called`, `func.error` and `func.status` counters.
pub const FUNC_COUNTER_SAMPLE_RATE: f64 = 0.77;

pub const FUNC_NAME_TAG: &str = "func_name";

pub const FUNC_CALLED: &str = "func.called";
pub const FUNC_ERROR: &str = "func.error";
pub const FUNC_STATUS: &str = "func.status";
pub const FUNC_TIMING: &str = "func.timing";
pub const FUNC_STUCK: &str = "func.stuck";

/// Render `tags` in the client's style with `func_name` appended last.
fn func_tags(state: &ClientState, name: &str, tags: &Tags) -> Vec<String> {
    let mut rendered = if tags.contains_key(FUNC_NAME_TAG) {
        let mut tags = tags.clone();
        tags.remove(FUNC_NAME_TAG);
        state.render(&tags)
    } else {
        state.render(tags)
    };
    state.style().push(&mut rendered, FUNC_NAME_TAG, name);
    rendered
}

/// Increment `metric` for `name` on `state`'s sink.
pub(crate) fn emit_func_counter(state: &ClientState, metric: &str, name: &str, tags: &Tags) {
    let rendered = func_tags(state, name, tags);
    swallow(
        metric,
        state
            .sink()
            .incr(metric, &rendered, FUNC_COUNTER_SAMPLE_RATE),
    );
}

pub(crate) fn emit_func_timing(state: &ClientState, name: &str, elapsed: Duration, tags: &Tags) {
    let rendered = func_tags(state, name, tags);
    swallow(
        FUNC_TIMING,
        state.sink().timing(FUNC_TIMING, elapsed, &rendered, 1.0),
    );
}

impl Registry {
    /// Increment `func.<action>` for `name`.
    pub fn report_func(&self, name: &str, action: &str, tags: &Tags) {
        if let Some(state) = self.active() {
            emit_func_counter(&state, &format!("func.{action}"), name, tags);
        }
    }

    pub fn report_func_call(&self, name: &str, tags: &Tags) {
        self.report_func(name, "called", tags);
    }

    pub fn report_func_error(&self, name: &str, tags: &Tags) {
        self.report_func(name, "error", tags);
    }

    pub fn report_func_status(&self, name: &str, tags: &Tags) {
        self.report_func(name, "status", tags);
    }

    /// Report `func.error` only when `result` is an error.
    pub fn report_func_result<T, E>(&self, name: &str, result: &Result<T, E>, tags: &Tags) {
        if result.is_err() {
            self.report_func_error(name, tags);
        }
    }

    /// Start timing `name`, with stuck detection.
    pub fn func_timing(&self, name: &str, tags: &Tags) -> FuncTimer {
        let Some(state) = self.active().filter(|state| !state.is_inert()) else {
            return FuncTimer::inert();
        };
        let start = Instant::now();

        let span: SpanSlot = Arc::new(Mutex::new(
            state.tracer().map(|tracer| tracer.start_span(name, tags)),
        ));

        let on_stuck = {
            let registry = self.clone();
            let state = state.clone();
            let name = name.to_string();
            let tags = tags.clone();
            let span = span.clone();
            move |elapsed: Duration| {
                tracing::warn!(func = %name, elapsed = ?elapsed, "Detected stuck function");
                if registry.is_current(&state) {
                    let rendered = func_tags(&state, &name, &tags);
                    swallow(FUNC_STUCK, state.sink().incr(FUNC_STUCK, &rendered, 1.0));
                }
                end_span(&span, Some("stuck"));
            }
        };
        let watchdog = Watchdog::spawn(state.stuck_threshold(), on_stuck);

        FuncTimer::start(
            self.clone(),
            state,
            name.to_string(),
            tags.clone(),
            start,
            watchdog,
            span,
        )
    }

    /// Report `func.called`, then start timing.
    pub fn func_call_and_timing(&self, name: &str, tags: &Tags) -> FuncTimer {
        self.report_func_call(name, tags);
        self.func_timing(name, tags)
    }

    /// Like [`Registry::func_call_and_timing`], also reporting errors on finish.
    pub fn func_call_and_timing_with_err(&self, name: &str, tags: &Tags) -> FuncCall {
        FuncCall::new(self.func_call_and_timing(name, tags))
    }

    /// Run `f` as one fully instrumented call.
    pub fn instrument<T, E, F>(&self, name: &str, tags: &Tags, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let call = self.func_call_and_timing_with_err(name, tags);
        let result = f();
        call.finish(&result);
        result
    }

    /// Await `fut` as one fully instrumented call.
    ///
    /// If the future is dropped before completion the timing is still
    /// reported, without an error.
    pub async fn instrument_async<T, E, Fut>(
        &self,
        name: &str,
        tags: &Tags,
        fut: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let call = self.func_call_and_timing_with_err(name, tags);
        let result = fut.await;
        call.finish(&result);
        result
    }
}
