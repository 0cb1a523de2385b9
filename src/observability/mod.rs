//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! statter itself produces:
//!     → logging.rs (structured log events: delivery failures, stuck calls)
//!     → tracing.rs (one span per instrumented call, optional)
//!     → profiling.rs (profiler started once at init, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Tracing and profiling are collaborators injected through the registry
//!   builder, off unless the config asks for them

pub mod logging;
pub mod profiling;
pub mod tracing;

pub use self::logging::{init_logging, LogFormat};
pub use self::profiling::{Profiler, ProfilerSettings};
pub use self::tracing::{ActiveSpan, SpanTracer, TracingSpans};
