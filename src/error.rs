//! Error types.
//!
//! # Taxonomy
//! - `MetricsError`: configuration errors, the only failure `init` surfaces
//! - `SinkError`: delivery or construction failure inside a sink
//!
//! # Design Decisions
//! - Delivery errors are logged and swallowed by the reporting paths
//! - Errors from instrumented business code are never wrapped here

use thiserror::Error;

/// Boxed error used at collaborator boundaries (profilers, tracers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned when configuring a [`Registry`](crate::client::Registry).
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("unsupported agent type: {0:?}")]
    UnsupportedAgent(String),

    #[error("statsd init failed: {0}")]
    SinkInit(#[source] SinkError),

    #[error("profiler start failed: {0}")]
    Profiler(#[source] BoxError),
}

/// Errors produced by a [`StatsSink`](crate::sink::StatsSink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot resolve sink address {0:?}")]
    Resolve(String),

    #[error("dogstatsd client error: {0}")]
    Statsd(#[from] cadence::MetricError),

    #[error("sink is closed")]
    Closed,
}
