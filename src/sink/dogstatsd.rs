//! DogStatsD client backed by `cadence`.
//!
//! # Wire Format
//! ```text
//! prefix.name:value|type|@rate|#env:prod,func_name:load
//! ```
//!
//! # Design Decisions
//! - `cadence` owns line rendering and the UDP write; this type adapts it
//!   to [`StatsSink`] and keeps closing and client-side sampling
//! - Tags arrive rendered as `key:value`; they are split at the first colon
//!   and tokens without one go out as bare values
//! - Timings are sent in whole milliseconds

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cadence::prelude::*;
use cadence::{Metric, MetricBuilder, StatsdClient, UdpMetricSink};

use super::{sampled, udp_towards, StatsSink};
use crate::error::SinkError;

pub struct DogStatsdSink {
    client: StatsdClient,
    target: SocketAddr,
    base_tags: Vec<String>,
    closed: AtomicBool,
}

impl DogStatsdSink {
    /// Resolve `address` and build a non-blocking client towards it.
    ///
    /// `base_tags` are rendered `key:value` tags attached to every metric.
    pub fn new(address: &str, prefix: &str, base_tags: Vec<String>) -> Result<Self, SinkError> {
        let (socket, target) = udp_towards(address)?;
        socket.set_nonblocking(true)?;
        let sink = UdpMetricSink::from(target, socket)?;
        let client = StatsdClient::from_sink(prefix.trim_end_matches('.'), sink);

        tracing::debug!(target = %target, "DogStatsD client ready");

        Ok(Self {
            client,
            target,
            base_tags,
            closed: AtomicBool::new(false),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Whether a metric at `rate` should go out at all.
    fn admit(&self, rate: f64) -> Result<bool, SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }
        Ok(sampled(rate))
    }

    fn send<'a, T>(
        &'a self,
        mut builder: MetricBuilder<'a, 'a, T>,
        tags: &'a [String],
        rate: f64,
    ) -> Result<(), SinkError>
    where
        T: Metric + From<String>,
    {
        for tag in self.base_tags.iter().chain(tags) {
            builder = match tag.split_once(':') {
                Some((key, value)) => builder.with_tag(key, value),
                None => builder.with_tag_value(tag),
            };
        }
        if rate < 1.0 {
            builder = builder.with_sampling_rate(rate);
        }
        builder.try_send()?;
        Ok(())
    }
}

impl StatsSink for DogStatsdSink {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        if !self.admit(rate)? {
            return Ok(());
        }
        self.send(self.client.count_with_tags(name, value), tags, rate)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        if !self.admit(rate)? {
            return Ok(());
        }
        self.send(self.client.gauge_with_tags(name, value), tags, rate)
    }

    fn timing(
        &self,
        name: &str,
        value: Duration,
        tags: &[String],
        rate: f64,
    ) -> Result<(), SinkError> {
        if !self.admit(rate)? {
            return Ok(());
        }
        self.send(self.client.time_with_tags(name, value), tags, rate)
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        if !self.admit(rate)? {
            return Ok(());
        }
        self.send(self.client.histogram_with_tags(name, value), tags, rate)
    }

    fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl std::fmt::Debug for DogStatsdSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DogStatsdSink")
            .field("target", &self.target)
            .field("base_tags", &self.base_tags)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
