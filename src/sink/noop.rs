//! Sink that discards everything. Installed by `Registry::disable`.

use std::time::Duration;

use super::StatsSink;
use crate::error::SinkError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StatsSink for NoopSink {
    fn count(&self, _: &str, _: i64, _: &[String], _: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn gauge(&self, _: &str, _: f64, _: &[String], _: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn timing(&self, _: &str, _: Duration, _: &[String], _: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn histogram(&self, _: &str, _: f64, _: &[String], _: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn is_noop(&self) -> bool {
        true
    }
}
