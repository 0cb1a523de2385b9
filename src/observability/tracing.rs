//! Distributed tracing support.
//!
//! # Responsibilities
//! - Start one span per instrumented call
//! - Attach the call's tags to the span
//! - Mark the span as errored when the call is reported stuck
//!
//! # Design Decisions
//! - Optional: tracing disabled by default for performance
//! - Pluggable via `SpanTracer`, default backed by `tracing` spans with
//!   OpenTelemetry-style field names so an otel layer can pick them up
//! - The default spans only record; they are never entered, so they are not
//!   an execution context for the instrumented code
//! - A span is ended exactly once, by whichever of stop/stuck gets there first

use crate::tags::Tags;

/// Starts spans for instrumented calls.
pub trait SpanTracer: Send + Sync {
    fn start_span(&self, name: &str, tags: &Tags) -> Box<dyn ActiveSpan>;

    /// Flush and release tracer resources. Called by `Registry::close`.
    fn shutdown(&self) {}
}

/// A span started by a [`SpanTracer`].
pub trait ActiveSpan: Send {
    fn set_error(&mut self, message: &str);

    fn end(self: Box<Self>);
}

/// Default tracer on top of the `tracing` crate.
///
/// Records, it does not propagate. Each call gets an `info` span named
/// `func` under the `statter::func` target, with the call name in
/// `otel.name` and every tag joined into one `tags` field
/// (`height=10,peer=a`), since `tracing` fields are declared statically.
/// The span is never entered: events logged by the instrumented code are not
/// parented to it and no trace context reaches downstream calls. Inject a
/// [`SpanTracer`] backed by a real tracing client for that.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSpans;

impl TracingSpans {
    fn span(name: &str, tags: &Tags) -> tracing::Span {
        tracing::info_span!(
            target: "statter::func",
            "func",
            otel.name = %name,
            tags = %tags,
            otel.status_code = tracing::field::Empty,
            otel.status_message = tracing::field::Empty,
        )
    }
}

impl SpanTracer for TracingSpans {
    fn start_span(&self, name: &str, tags: &Tags) -> Box<dyn ActiveSpan> {
        Box::new(TracingSpan {
            span: Self::span(name, tags),
        })
    }
}

struct TracingSpan {
    span: tracing::Span,
}

impl ActiveSpan for TracingSpan {
    fn set_error(&mut self, message: &str) {
        self.span.record("otel.status_code", "ERROR");
        self.span.record("otel.status_message", message);
    }

    fn end(self: Box<Self>) {
        drop(self.span);
    }
}
