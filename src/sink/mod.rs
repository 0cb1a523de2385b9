//! Statistics sinks.
//!
//! # Responsibilities
//! - Define the capability set every sink offers (count, gauge, timing, ...)
//! - Provide the in-process variants (no-op, logging, recording)
//! - Provide the UDP clients used in production: DogStatsD over `cadence`,
//!   and a hand-written InfluxDB-tagged line writer for Telegraf
//!
//! # Design Decisions
//! - Tags arrive already rendered in the registry's style
//! - Sampling is the sink's job; callers only pass the rate
//! - Every call returns a delivery error the caller logs and drops

pub mod dogstatsd;
pub mod logging;
pub mod noop;
pub mod recording;
pub mod telegraf;

pub use dogstatsd::DogStatsdSink;
pub use logging::LoggingSink;
pub use noop::NoopSink;
pub use recording::{CallKind, MetricValue, RecordedCall, RecordingSink};
pub use telegraf::TelegrafSink;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use rand::Rng;

use crate::error::SinkError;

/// Destination for metric emissions.
pub trait StatsSink: Send + Sync {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError>;

    fn incr(&self, name: &str, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.count(name, 1, tags, rate)
    }

    fn decr(&self, name: &str, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.count(name, -1, tags, rate)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError>;

    fn timing(
        &self,
        name: &str,
        value: Duration,
        tags: &[String],
        rate: f64,
    ) -> Result<(), SinkError>;

    fn histogram(&self, name: &str, value: f64, tags: &[String], rate: f64)
        -> Result<(), SinkError>;

    fn close(&self) -> Result<(), SinkError>;

    /// True for sinks that discard everything, letting callers skip work.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Log a failed delivery and drop it.
pub(crate) fn swallow(metric: &str, result: Result<(), SinkError>) {
    if let Err(e) = result {
        tracing::debug!(metric = %metric, error = %e, "Metric delivery failed");
    }
}

/// Resolve `address` and bind an ephemeral local socket of the same family.
pub(crate) fn udp_towards(address: &str) -> Result<(UdpSocket, SocketAddr), SinkError> {
    let target = address
        .to_socket_addrs()
        .map_err(|_| SinkError::Resolve(address.to_string()))?
        .next()
        .ok_or_else(|| SinkError::Resolve(address.to_string()))?;

    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local)?;
    Ok((socket, target))
}

/// Client-side sampling decision for `rate`.
pub(crate) fn sampled(rate: f64) -> bool {
    if rate >= 1.0 {
        return true;
    }
    if rate <= 0.0 {
        return false;
    }
    rand::thread_rng().gen::<f64>() < rate
}
