//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::MetricsError;
use crate::tags::TagStyle;

/// Stuck thresholds below this are replaced by the default.
pub const MIN_STUCK_FUNCTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Default stuck-function threshold.
pub const DEFAULT_STUCK_FUNCTION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Environment name used when none is configured.
pub const DEFAULT_ENV_NAME: &str = "local";

/// Metrics agent flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Datadog,
    Telegraf,
}

impl Agent {
    pub fn as_str(self) -> &'static str {
        match self {
            Agent::Datadog => "datadog",
            Agent::Telegraf => "telegraf",
        }
    }

    pub fn tag_style(self) -> TagStyle {
        match self {
            Agent::Datadog => TagStyle::Colon,
            Agent::Telegraf => TagStyle::Pairs,
        }
    }
}

impl FromStr for Agent {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datadog" => Ok(Agent::Datadog),
            "telegraf" => Ok(Agent::Telegraf),
            other => Err(MetricsError::UnsupportedAgent(other.to_string())),
        }
    }
}

/// Root configuration for the metrics client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatterConfig {
    /// StatsD endpoint (e.g., "127.0.0.1:8125").
    pub address: String,

    /// Namespace prepended to every metric name.
    pub prefix: String,

    /// Agent flavor: "datadog" or "telegraf".
    pub agent: String,

    /// Deployment environment (dev/test/staging/prod).
    pub env_name: String,

    /// Host identification, reported as the `machine` tag.
    pub host_name: String,

    /// Service version, forwarded to the profiler.
    pub version: String,

    /// Threshold after which an instrumented call is reported stuck, in milliseconds.
    pub stuck_function_timeout_ms: u64,

    /// Log metrics instead of sending them.
    pub mocking_enabled: bool,

    /// With mocking, only log timings above this many milliseconds.
    pub mocking_threshold_ms: u64,

    /// Disable metrics completely.
    pub disabled: bool,

    /// Start spans per instrumented call (datadog agent only).
    pub tracing_enabled: bool,

    /// Start the profiler at init (datadog agent only).
    pub profiling_enabled: bool,

    /// Extra tags attached to every metric.
    pub default_tags: BTreeMap<String, String>,
}

impl Default for StatterConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8125".to_string(),
            prefix: String::new(),
            agent: Agent::Telegraf.as_str().to_string(),
            env_name: String::new(),
            host_name: String::new(),
            version: String::new(),
            stuck_function_timeout_ms: DEFAULT_STUCK_FUNCTION_TIMEOUT.as_millis() as u64,
            mocking_enabled: false,
            mocking_threshold_ms: 0,
            disabled: false,
            tracing_enabled: false,
            profiling_enabled: false,
            default_tags: BTreeMap::new(),
        }
    }
}

impl StatterConfig {
    /// Apply defaults: clamp the stuck threshold, fill in the env name.
    pub fn normalized(mut self) -> Self {
        if self.stuck_function_timeout() < MIN_STUCK_FUNCTION_TIMEOUT {
            self.stuck_function_timeout_ms = DEFAULT_STUCK_FUNCTION_TIMEOUT.as_millis() as u64;
        }
        if self.env_name.is_empty() {
            self.env_name = DEFAULT_ENV_NAME.to_string();
        }
        self
    }

    pub fn stuck_function_timeout(&self) -> Duration {
        Duration::from_millis(self.stuck_function_timeout_ms)
    }

    pub fn mocking_threshold(&self) -> Duration {
        Duration::from_millis(self.mocking_threshold_ms)
    }

    pub fn parsed_agent(&self) -> Result<Agent, MetricsError> {
        self.agent.parse()
    }

    /// Colon style for datadog, key/value pairs for everything else.
    pub fn tag_style(&self) -> TagStyle {
        match self.parsed_agent() {
            Ok(agent) => agent.tag_style(),
            Err(_) => TagStyle::Pairs,
        }
    }

    /// Tags attached to every metric by the sink: env, machine, then defaults.
    pub fn base_tags(&self) -> Vec<String> {
        let style = self.tag_style();
        let mut tags = Vec::new();
        if !self.env_name.is_empty() {
            style.push(&mut tags, "env", &self.env_name);
        }
        if !self.host_name.is_empty() {
            style.push(&mut tags, "machine", &self.host_name);
        }
        for (key, value) in &self.default_tags {
            style.push(&mut tags, key, value);
        }
        tags
    }
}
