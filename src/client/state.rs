//! Snapshot of an installed client.

use std::sync::Arc;
use std::time::Duration;

use crate::config::StatterConfig;
use crate::observability::SpanTracer;
use crate::sink::StatsSink;
use crate::tags::{TagStyle, Tags};

/// Everything a reporting call needs, swapped in and out as one unit.
pub struct ClientState {
    pub(crate) sink: Arc<dyn StatsSink>,
    pub(crate) config: StatterConfig,
    pub(crate) style: TagStyle,
    pub(crate) tracer: Option<Arc<dyn SpanTracer>>,
}

impl ClientState {
    pub(crate) fn new(
        sink: Arc<dyn StatsSink>,
        config: StatterConfig,
        tracer: Option<Arc<dyn SpanTracer>>,
    ) -> Self {
        let style = config.tag_style();
        Self {
            sink,
            config,
            style,
            tracer,
        }
    }

    pub fn sink(&self) -> &dyn StatsSink {
        self.sink.as_ref()
    }

    pub fn config(&self) -> &StatterConfig {
        &self.config
    }

    pub fn style(&self) -> TagStyle {
        self.style
    }

    pub fn stuck_threshold(&self) -> Duration {
        self.config.stuck_function_timeout()
    }

    /// True when emissions go nowhere and background work can be skipped.
    pub fn is_inert(&self) -> bool {
        self.sink.is_noop()
    }

    pub(crate) fn tracer(&self) -> Option<&Arc<dyn SpanTracer>> {
        self.tracer.as_ref()
    }

    pub(crate) fn render(&self, tags: &Tags) -> Vec<String> {
        tags.join(self.style)
    }
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("config", &self.config)
            .field("style", &self.style)
            .field("tracing", &self.tracer.is_some())
            .finish_non_exhaustive()
    }
}
