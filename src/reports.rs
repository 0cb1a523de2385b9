//! Ad-hoc metric reporting.
//!
//! Thin wrappers around the active sink for metrics that aren't tied to a
//! function invocation. All of them are no-ops without an active client and
//! report at sample rate 1.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::client::Registry;
use crate::sink::{swallow, StatsSink};
use crate::tags::{bool_tag, Integer, Tags};

impl Registry {
    /// Run `report` against the active sink with `tags` rendered in its style.
    pub fn custom_report<F>(&self, tags: &Tags, report: F)
    where
        F: FnOnce(&dyn StatsSink, &[String]),
    {
        let Some(state) = self.active() else {
            return;
        };
        let rendered = state.render(tags);
        report(state.sink(), &rendered);
    }

    /// Values outside the `i64` range saturate.
    pub fn counter(&self, metric: &str, value: impl Integer, tags: &Tags) {
        let value = value.saturating_i64();
        self.custom_report(tags, |sink, rendered| {
            swallow(metric, sink.count(metric, value, rendered, 1.0));
        });
    }

    /// Like [`Registry::counter`], skipping zero and negative values.
    pub fn counter_positive(&self, metric: &str, value: impl Integer, tags: &Tags) {
        let value = value.saturating_i64();
        if value > 0 {
            self.counter(metric, value, tags);
        }
    }

    pub fn incr(&self, metric: &str, tags: &Tags) {
        self.counter(metric, 1, tags);
    }

    pub fn decr(&self, metric: &str, tags: &Tags) {
        self.counter(metric, -1, tags);
    }

    pub fn gauge(&self, metric: &str, value: f64, tags: &Tags) {
        self.custom_report(tags, |sink, rendered| {
            swallow(metric, sink.gauge(metric, value, rendered, 1.0));
        });
    }

    pub fn histogram(&self, metric: &str, value: f64, tags: &Tags) {
        self.custom_report(tags, |sink, rendered| {
            swallow(metric, sink.histogram(metric, value, rendered, 1.0));
        });
    }

    pub fn timer(&self, metric: &str, value: Duration, tags: &Tags) {
        self.custom_report(tags, |sink, rendered| {
            swallow(metric, sink.timing(metric, value, rendered, 1.0));
        });
    }

    /// Start a [`Timing`] guard for `metric`.
    pub fn timing(&self, metric: &str, tags: &Tags) -> Timing {
        Timing {
            registry: self.clone(),
            metric: metric.to_string(),
            tags: tags.clone(),
            start: Instant::now(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Start a [`TimingWithErr`] guard for `metric`.
    pub fn timing_with_err(&self, metric: &str, tags: &Tags) -> TimingWithErr {
        TimingWithErr {
            timing: self.timing(metric, tags),
        }
    }
}

/// Measures a block and reports it through [`Registry::timer`].
///
/// Stopping twice reports once. Dropping an unstopped guard stops it.
#[must_use = "the metric is reported when this guard is stopped or dropped"]
#[derive(Debug)]
pub struct Timing {
    registry: Registry,
    metric: String,
    tags: Tags,
    start: Instant,
    stopped: AtomicBool,
}

impl Timing {
    pub fn stop(&self) {
        self.stop_with(&Tags::new());
    }

    /// Report the elapsed time with `deferred` merged over the initial tags.
    pub fn stop_with(&self, deferred: &Tags) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let tags = self.tags.merged(deferred);
        self.registry
            .timer(&self.metric, self.start.elapsed(), &tags);
    }
}

impl Drop for Timing {
    fn drop(&mut self) {
        self.stop();
    }
}

/// [`Timing`] that tags the outcome as `error:true` or `error:false`.
#[must_use = "finish with the result to report the metric"]
#[derive(Debug)]
pub struct TimingWithErr {
    timing: Timing,
}

impl TimingWithErr {
    pub fn finish<T, E>(self, result: &Result<T, E>, deferred: &Tags) {
        let tags = deferred.clone().with("error", bool_tag(result.is_err()));
        self.timing.stop_with(&tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatterConfig;
    use crate::sink::{CallKind, MetricValue, RecordedCall, RecordingSink};
    use crate::tags;
    use std::sync::Arc;

    fn recording(agent: &str) -> (Registry, Arc<RecordingSink>) {
        let registry = Registry::new();
        let sink = Arc::new(RecordingSink::new());
        let config = StatterConfig {
            agent: agent.into(),
            ..Default::default()
        };
        registry.with_sink(sink.clone(), &config);
        (registry, sink)
    }

    #[test]
    fn test_counter_recorded_exactly() {
        let (registry, sink) = recording("datadog");
        registry.counter("my-counter", 5, &tags! { "foo" => "bar" });

        assert_eq!(
            sink.calls(),
            vec![RecordedCall {
                kind: CallKind::Count,
                name: "my-counter".into(),
                value: MetricValue::Int(5),
                tags: vec!["foo:bar".into()],
                rate: 1.0,
            }]
        );
    }

    #[test]
    fn test_counter_telegraf_style() {
        let (registry, sink) = recording("telegraf");
        registry.counter("my-counter", 5, &tags! { "foo" => "bar" });
        assert_eq!(sink.calls()[0].tags, vec!["foo", "bar"]);
    }

    #[test]
    fn test_each_report_once() {
        let (registry, sink) = recording("datadog");
        let tags = tags! { "foo" => "bar" };
        registry.incr("my-incr", &tags);
        registry.decr("my-decr", &tags);
        registry.gauge("my-gauge", 1.5, &tags);
        registry.histogram("my-histogram", 42.0, &tags);
        registry.timer("my-timer", Duration::from_millis(7), &tags);

        let calls = sink.calls();
        let summary: Vec<_> = calls
            .iter()
            .map(|c| (c.kind, c.name.as_str(), c.value.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (CallKind::Count, "my-incr", MetricValue::Int(1)),
                (CallKind::Count, "my-decr", MetricValue::Int(-1)),
                (CallKind::Gauge, "my-gauge", MetricValue::Float(1.5)),
                (CallKind::Histogram, "my-histogram", MetricValue::Float(42.0)),
                (CallKind::Timing, "my-timer", MetricValue::Duration(Duration::from_millis(7))),
            ]
        );
        assert!(calls.iter().all(|c| c.tags == vec!["foo:bar"]));
    }

    #[test]
    fn test_counter_positive() {
        let (registry, sink) = recording("datadog");
        registry.counter_positive("dropped", 0, &Tags::new());
        registry.counter_positive("dropped", -3, &Tags::new());
        assert!(sink.is_empty());

        registry.counter_positive("dropped", 3u32, &Tags::new());
        assert_eq!(sink.calls()[0].value, MetricValue::Int(3));
    }

    #[test]
    fn test_counter_accepts_any_integer_width() {
        let (registry, sink) = recording("datadog");
        let queue = vec!["a", "b", "c"];
        registry.counter("queue.len", queue.len(), &Tags::new());
        registry.counter("offset", -2isize, &Tags::new());
        registry.counter("bytes", u64::MAX, &Tags::new());
        registry.counter_positive("ids", u128::MAX, &Tags::new());

        let values: Vec<_> = sink.calls().into_iter().map(|c| c.value).collect();
        assert_eq!(
            values,
            vec![
                MetricValue::Int(3),
                MetricValue::Int(-2),
                MetricValue::Int(i64::MAX),
                MetricValue::Int(i64::MAX),
            ]
        );
    }

    #[test]
    fn test_custom_report() {
        let (registry, sink) = recording("datadog");
        registry.custom_report(&tags! { "batch" => "spot" }, |s, tags| {
            s.count("events.batch.size", 12, tags, 1.0).unwrap();
        });
        assert_eq!(sink.calls()[0].tags, vec!["batch:spot"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timing_guard() {
        let (registry, sink) = recording("datadog");
        let timing = registry.timing("db.query", &tags! { "table" => "orders", "rows" => 0 });
        tokio::time::sleep(Duration::from_millis(20)).await;
        timing.stop_with(&tags! { "rows" => 15 });
        timing.stop();
        drop(timing);

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tags, vec!["rows:15", "table:orders"]);
        assert!(matches!(calls[0].value, MetricValue::Duration(d) if d >= Duration::from_millis(20)));
    }

    #[test]
    fn test_timing_with_err() {
        let (registry, sink) = recording("datadog");
        registry
            .timing_with_err("rpc", &Tags::new())
            .finish(&Err::<(), _>("refused"), &tags! { "peer" => "a" });
        registry
            .timing_with_err("rpc", &Tags::new())
            .finish(&Ok::<_, ()>(()), &Tags::new());

        let calls = sink.named("rpc");
        assert_eq!(calls[0].tags, vec!["error:true", "peer:a"]);
        assert_eq!(calls[1].tags, vec!["error:false"]);
    }

    #[test]
    fn test_no_client_no_reports() {
        let registry = Registry::new();
        registry.counter("c", 1, &Tags::new());
        registry.gauge("g", 1.0, &Tags::new());
        registry.timing("t", &Tags::new()).stop();
        registry.custom_report(&Tags::new(), |_, _| panic!("no sink to report to"));
    }
}
