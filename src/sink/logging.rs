//! Logging stand-in for a real statsd client.
//!
//! Used when mocking is enabled: nothing leaves the process, every call is
//! written to the `tracing` log at debug level.
//!
//! # Threshold
//! With a non-zero threshold, counters and gauges are suppressed and only
//! timings (and histograms, read as milliseconds) above the threshold are
//! logged. Useful to surface slow calls in local runs without the noise.

use std::time::Duration;

use super::StatsSink;
use crate::error::SinkError;

#[derive(Debug, Default, Clone)]
pub struct LoggingSink {
    threshold: Duration,
}

impl LoggingSink {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    fn quiet(&self) -> bool {
        !self.threshold.is_zero()
    }
}

impl StatsSink for LoggingSink {
    fn count(&self, name: &str, value: i64, tags: &[String], _: f64) -> Result<(), SinkError> {
        if !self.quiet() {
            tracing::debug!(target: "statter::mock", tags = ?tags, "Count {name}: {value}");
        }
        Ok(())
    }

    fn incr(&self, name: &str, tags: &[String], _: f64) -> Result<(), SinkError> {
        if !self.quiet() {
            tracing::debug!(target: "statter::mock", tags = ?tags, "Incr {name}");
        }
        Ok(())
    }

    fn decr(&self, name: &str, tags: &[String], _: f64) -> Result<(), SinkError> {
        if !self.quiet() {
            tracing::debug!(target: "statter::mock", tags = ?tags, "Decr {name}");
        }
        Ok(())
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], _: f64) -> Result<(), SinkError> {
        if !self.quiet() {
            tracing::debug!(target: "statter::mock", tags = ?tags, "Gauge {name}: {value}");
        }
        Ok(())
    }

    fn timing(&self, name: &str, value: Duration, tags: &[String], _: f64) -> Result<(), SinkError> {
        if value > self.threshold {
            tracing::debug!(target: "statter::mock", tags = ?tags, "Timing {name}: {value:?}");
        }
        Ok(())
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], _: f64) -> Result<(), SinkError> {
        if value > self.threshold.as_millis() as f64 {
            tracing::debug!(target: "statter::mock", tags = ?tags, "Histogram {name}: {value}");
        }
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        tracing::debug!(target: "statter::mock", "Mock statter closed");
        Ok(())
    }
}
