//! UDP StatsD client for Telegraf.
//!
//! # Responsibilities
//! - Render InfluxDB-tagged StatsD lines
//! - Apply client-side sampling for rates below 1
//! - Send each line as one datagram, fire-and-forget
//!
//! # Wire Format
//! ```text
//! prefix.name,env=prod,func_name=load:value|type|@rate
//! ```
//!
//! # Design Decisions
//! - Tags arrive as alternating key and value tokens and are joined here
//! - One datagram per metric, no buffering (aggregation belongs to the agent)
//! - Base tags are attached to every line here, not by the registry

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{sampled, udp_towards, StatsSink};
use crate::error::SinkError;

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct TelegrafSink {
    socket: UdpSocket,
    target: SocketAddr,
    prefix: String,
    base_tags: Vec<String>,
    closed: AtomicBool,
}

impl TelegrafSink {
    /// Resolve `address` and bind an ephemeral local socket towards it.
    ///
    /// `base_tags` are alternating key and value tokens, like metric tags.
    pub fn new(address: &str, prefix: &str, base_tags: Vec<String>) -> Result<Self, SinkError> {
        let (socket, target) = udp_towards(address)?;
        socket.set_write_timeout(Some(WRITE_TIMEOUT))?;

        tracing::debug!(target = %target, "Telegraf socket bound");

        Ok(Self {
            socket,
            target,
            prefix: metric_prefix(prefix),
            base_tags,
            closed: AtomicBool::new(false),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn send(
        &self,
        name: &str,
        value: &str,
        kind: &str,
        tags: &[String],
        rate: f64,
    ) -> Result<(), SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }
        if !sampled(rate) {
            return Ok(());
        }
        let line = self.render(name, value, kind, tags, rate);
        self.socket.send_to(line.as_bytes(), self.target)?;
        Ok(())
    }

    pub(crate) fn render(
        &self,
        name: &str,
        value: &str,
        kind: &str,
        tags: &[String],
        rate: f64,
    ) -> String {
        let mut line = String::with_capacity(64);
        line.push_str(&self.prefix);
        line.push_str(name);

        let pairs = self
            .base_tags
            .chunks_exact(2)
            .chain(tags.chunks_exact(2));
        for pair in pairs {
            line.push(',');
            line.push_str(&pair[0]);
            line.push('=');
            line.push_str(&pair[1]);
        }

        line.push(':');
        line.push_str(value);
        line.push('|');
        line.push_str(kind);
        if rate < 1.0 {
            line.push_str("|@");
            line.push_str(&rate.to_string());
        }
        line
    }
}

impl StatsSink for TelegrafSink {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.send(name, &value.to_string(), "c", tags, rate)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.send(name, &value.to_string(), "g", tags, rate)
    }

    fn timing(
        &self,
        name: &str,
        value: Duration,
        tags: &[String],
        rate: f64,
    ) -> Result<(), SinkError> {
        let millis = value.as_nanos() as f64 / 1_000_000.0;
        self.send(name, &millis.to_string(), "ms", tags, rate)
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.send(name, &value.to_string(), "h", tags, rate)
    }

    fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

fn metric_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{prefix}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> (UdpSocket, String) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = socket.local_addr().unwrap().to_string();
        (socket, addr)
    }

    fn recv_line(socket: &UdpSocket) -> String {
        let mut buf = [0u8; 1024];
        let (n, _) = socket.recv_from(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    #[test]
    fn test_timing_line() {
        let (rx, addr) = receiver();
        let sink = TelegrafSink::new(&addr, "app.", vec!["env".into(), "dev".into()]).unwrap();

        sink.timing(
            "func.timing",
            Duration::from_millis(12),
            &["func_name".into(), "load".into()],
            1.0,
        )
        .unwrap();
        assert_eq!(
            recv_line(&rx),
            "app.func.timing,env=dev,func_name=load:12|ms"
        );
    }

    #[test]
    fn test_counter_and_gauge_lines() {
        let (rx, addr) = receiver();
        let sink = TelegrafSink::new(&addr, "app", vec![]).unwrap();

        sink.count("requests", 5, &["foo".into(), "bar".into()], 1.0).unwrap();
        assert_eq!(recv_line(&rx), "app.requests,foo=bar:5|c");

        sink.gauge("depth", 2.5, &[], 1.0).unwrap();
        assert_eq!(recv_line(&rx), "app.depth:2.5|g");
    }

    #[test]
    fn test_render_with_rate() {
        let sink = TelegrafSink::new("127.0.0.1:8125", "", vec![]).unwrap();
        assert_eq!(
            sink.render("func.called", "1", "c", &["func_name".into(), "x".into()], 0.77),
            "func.called,func_name=x:1|c|@0.77"
        );
    }

    #[test]
    fn test_closed_sink_rejects_sends() {
        let sink = TelegrafSink::new("127.0.0.1:8125", "", vec![]).unwrap();
        sink.close().unwrap();
        assert!(matches!(
            sink.count("x", 1, &[], 1.0),
            Err(SinkError::Closed)
        ));
    }

    #[test]
    fn test_unresolvable_address() {
        let err = TelegrafSink::new("not an address", "", vec![]).unwrap_err();
        assert!(matches!(err, SinkError::Resolve(_)));
    }
}
