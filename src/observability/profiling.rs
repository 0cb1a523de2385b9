//! Continuous profiling hook.
//!
//! The profiler itself lives outside this crate; the registry only starts it
//! once at init, fire-and-forget, and never touches it again.

use crate::config::StatterConfig;
use crate::error::BoxError;

/// Identification handed to the profiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerSettings {
    pub service: String,
    pub env: String,
    pub version: String,
    pub hostname: String,
}

impl ProfilerSettings {
    pub fn from_config(config: &StatterConfig) -> Self {
        Self {
            service: config.prefix.clone(),
            env: config.env_name.clone(),
            version: config.version.clone(),
            hostname: config.host_name.clone(),
        }
    }
}

pub trait Profiler: Send + Sync {
    fn start(&self, settings: &ProfilerSettings) -> Result<(), BoxError>;
}
