//! In-memory sink that records every call, for assertions in tests.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::StatsSink;
use crate::error::SinkError;

/// Which sink method was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Count,
    Incr,
    Decr,
    Gauge,
    Timing,
    Histogram,
    Close,
}

/// Value carried by a recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    None,
    Int(i64),
    Float(f64),
    Duration(Duration),
}

/// A single recorded sink invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub name: String,
    pub value: MetricValue,
    pub tags: Vec<String>,
    pub rate: f64,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all calls so far, in emission order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<RecordedCall> {
        std::mem::take(&mut *self.lock())
    }

    /// Calls with the given metric name.
    pub fn named(&self, name: &str) -> Vec<RecordedCall> {
        self.lock().iter().filter(|c| c.name == name).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, kind: CallKind, name: &str, value: MetricValue, tags: &[String], rate: f64) {
        self.lock().push(RecordedCall {
            kind,
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
            rate,
        });
    }
}

impl StatsSink for RecordingSink {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.record(CallKind::Count, name, MetricValue::Int(value), tags, rate);
        Ok(())
    }

    fn incr(&self, name: &str, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.record(CallKind::Incr, name, MetricValue::None, tags, rate);
        Ok(())
    }

    fn decr(&self, name: &str, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.record(CallKind::Decr, name, MetricValue::None, tags, rate);
        Ok(())
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.record(CallKind::Gauge, name, MetricValue::Float(value), tags, rate);
        Ok(())
    }

    fn timing(
        &self,
        name: &str,
        value: Duration,
        tags: &[String],
        rate: f64,
    ) -> Result<(), SinkError> {
        self.record(CallKind::Timing, name, MetricValue::Duration(value), tags, rate);
        Ok(())
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.record(CallKind::Histogram, name, MetricValue::Float(value), tags, rate);
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.record(CallKind::Close, "", MetricValue::None, &[], 1.0);
        Ok(())
    }
}
