//! Shared utilities for integration and load testing.

use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use statter::sink::RecordingSink;
use statter::{Registry, StatterConfig};

/// Registry with a recording sink installed.
pub fn recording_registry(agent: &str, stuck_ms: u64) -> (Registry, Arc<RecordingSink>) {
    let registry = Registry::new();
    let sink = Arc::new(RecordingSink::new());
    let config = StatterConfig {
        agent: agent.into(),
        stuck_function_timeout_ms: stuck_ms,
        ..Default::default()
    };
    registry.with_sink(sink.clone(), &config);
    (registry, sink)
}

/// A local UDP socket standing in for a StatsD agent.
#[allow(dead_code)]
pub struct MockAgent {
    socket: UdpSocket,
}

#[allow(dead_code)]
impl MockAgent {
    pub fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        Self { socket }
    }

    pub fn address(&self) -> String {
        self.socket.local_addr().unwrap().to_string()
    }

    /// Next datagram as text.
    pub fn recv(&self) -> String {
        let mut buf = [0u8; 2048];
        let (len, _) = self.socket.recv_from(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..len]).into_owned()
    }

    /// Next DogStatsD datagram, split into the metric head and its sorted tags.
    pub fn recv_dogstatsd(&self) -> (String, Vec<String>) {
        let line = self.recv();
        match line.split_once("|#") {
            Some((head, tags)) => {
                let mut tags: Vec<String> = tags.split(',').map(String::from).collect();
                tags.sort();
                (head.to_string(), tags)
            }
            None => (line, Vec::new()),
        }
    }
}
