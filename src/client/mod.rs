//! Client registry.
//!
//! # Responsibilities
//! - Own the single active sink and its derived configuration
//! - Build the right sink for the configured agent flavor
//! - Start the optional tracing and profiling collaborators
//! - Hand consistent snapshots to concurrent reporting calls
//!
//! # Concurrency
//! ```text
//! init / close / disable / with_sink
//!     → writer mutex (exclusive)
//!     → atomic swap of Arc<ClientState>
//!
//! reporting call / watchdog firing
//!     → lock-free load of Arc<ClientState> (shared)
//!     → sink call outside of any lock
//! ```
//!
//! # Design Decisions
//! - An explicit value owned by the composition root, not a global
//! - Cloning a `Registry` shares the same client
//! - No client installed is a legal state: every report is a no-op
//! - A snapshot taken before `close` may still finish its one emission

mod state;

pub use state::ClientState;

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;

use crate::config::{Agent, StatterConfig};
use crate::error::MetricsError;
use crate::observability::{Profiler, ProfilerSettings, SpanTracer, TracingSpans};
use crate::sink::{swallow, DogStatsdSink, LoggingSink, NoopSink, StatsSink, TelegrafSink};

#[derive(Default)]
struct Inner {
    state: ArcSwapOption<ClientState>,
    writer: Mutex<()>,
    tracer: Option<Arc<dyn SpanTracer>>,
    profiler: Option<Arc<dyn Profiler>>,
}

/// Handle to the process metrics client.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

/// Builder injecting optional collaborators into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    tracer: Option<Arc<dyn SpanTracer>>,
    profiler: Option<Arc<dyn Profiler>>,
}

impl RegistryBuilder {
    /// Tracer used when tracing is enabled (default: [`TracingSpans`]).
    pub fn tracer(mut self, tracer: Arc<dyn SpanTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Profiler started when profiling is enabled.
    pub fn profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            inner: Arc::new(Inner {
                tracer: self.tracer,
                profiler: self.profiler,
                ..Default::default()
            }),
        }
    }
}

impl Registry {
    /// A registry with nothing installed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Configure the client from `config`'s own address and prefix.
    pub fn init_with_config(&self, config: &StatterConfig) -> Result<(), MetricsError> {
        self.init(&config.address, &config.prefix, config)
    }

    /// Build and install a sink for `address`, namespaced by `prefix`.
    pub fn init(
        &self,
        address: &str,
        prefix: &str,
        config: &StatterConfig,
    ) -> Result<(), MetricsError> {
        if config.disabled {
            self.disable();
            return Ok(());
        }

        let mut config = config.clone().normalized();
        config.address = address.to_string();
        config.prefix = prefix.to_string();

        if config.mocking_enabled {
            let sink = Arc::new(LoggingSink::new(config.mocking_threshold()));
            tracing::info!(env = %config.env_name, "Mock statter installed");
            self.install(ClientState::new(sink, config, None));
            return Ok(());
        }

        let agent = config.parsed_agent()?;
        let base_tags = config.base_tags();
        let sink: Arc<dyn StatsSink> = match agent {
            Agent::Datadog => Arc::new(
                DogStatsdSink::new(address, prefix, base_tags).map_err(MetricsError::SinkInit)?,
            ),
            Agent::Telegraf => Arc::new(
                TelegrafSink::new(address, prefix, base_tags).map_err(MetricsError::SinkInit)?,
            ),
        };

        let tracer = (agent == Agent::Datadog && config.tracing_enabled).then(|| self.tracer());
        let profiling = agent == Agent::Datadog && config.profiling_enabled;

        tracing::info!(
            address = %address,
            agent = agent.as_str(),
            env = %config.env_name,
            tracing = tracer.is_some(),
            "Statsd client installed"
        );
        self.install(ClientState::new(sink, config.clone(), tracer));

        if profiling {
            self.start_profiler(&config)?;
        }
        Ok(())
    }

    /// Install an arbitrary sink, e.g. a test double or a custom transport.
    pub fn with_sink(&self, sink: Arc<dyn StatsSink>, config: &StatterConfig) {
        let config = config.clone().normalized();
        let tracer = config.tracing_enabled.then(|| self.tracer());
        self.install(ClientState::new(sink, config, tracer));
    }

    /// Make every report inert without any network configuration.
    pub fn disable(&self) {
        let config = StatterConfig::default().normalized();
        self.install(ClientState::new(Arc::new(NoopSink), config, None));
        tracing::debug!("Metrics disabled");
    }

    /// Detach and close the active client. No-op when nothing is installed.
    pub fn close(&self) {
        let _guard = self.lock_writer();
        if let Some(previous) = self.inner.state.swap(None) {
            release(&previous);
        }
    }

    /// True when a sink that actually emits is installed.
    pub fn is_active(&self) -> bool {
        self.inner
            .state
            .load()
            .as_ref()
            .is_some_and(|state| !state.is_inert())
    }

    /// The normalized configuration of the active client.
    pub fn config(&self) -> Option<StatterConfig> {
        self.inner
            .state
            .load()
            .as_ref()
            .map(|state| state.config.clone())
    }

    /// Snapshot of the active client, if any.
    pub fn active(&self) -> Option<Arc<ClientState>> {
        self.inner.state.load_full()
    }

    /// True while `state` is still the installed client.
    pub(crate) fn is_current(&self, state: &Arc<ClientState>) -> bool {
        self.inner
            .state
            .load()
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, state))
    }

    fn install(&self, state: ClientState) {
        let _guard = self.lock_writer();
        if let Some(previous) = self.inner.state.swap(Some(Arc::new(state))) {
            release(&previous);
        }
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn tracer(&self) -> Arc<dyn SpanTracer> {
        self.inner
            .tracer
            .clone()
            .unwrap_or_else(|| Arc::new(TracingSpans))
    }

    fn start_profiler(&self, config: &StatterConfig) -> Result<(), MetricsError> {
        let Some(profiler) = &self.inner.profiler else {
            tracing::warn!("Profiling enabled but no profiler configured, skipping");
            return Ok(());
        };
        let settings = ProfilerSettings::from_config(config);
        profiler.start(&settings).map_err(MetricsError::Profiler)?;
        tracing::info!(service = %settings.service, "Profiler started");
        Ok(())
    }
}

fn release(state: &ClientState) {
    if let Some(tracer) = state.tracer() {
        tracer.shutdown();
    }
    swallow("close", state.sink.close());
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("state", &self.inner.state.load_full())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::sink::{CallKind, RecordingSink};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct StubProfiler {
        started: StdMutex<Vec<ProfilerSettings>>,
        fail: bool,
    }

    impl Profiler for StubProfiler {
        fn start(&self, settings: &ProfilerSettings) -> Result<(), BoxError> {
            if self.fail {
                return Err("no agent".into());
            }
            self.started.lock().unwrap().push(settings.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubTracer {
        shutdowns: AtomicUsize,
    }

    impl SpanTracer for StubTracer {
        fn start_span(
            &self,
            name: &str,
            tags: &crate::tags::Tags,
        ) -> Box<dyn crate::observability::ActiveSpan> {
            TracingSpans.start_span(name, tags)
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn datadog() -> StatterConfig {
        StatterConfig {
            agent: "datadog".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_registry_is_inactive() {
        let registry = Registry::new();
        assert!(!registry.is_active());
        assert!(registry.active().is_none());
        registry.close();
    }

    #[test]
    fn test_init_mocked() {
        let registry = Registry::new();
        let config = StatterConfig {
            mocking_enabled: true,
            agent: String::new(),
            ..Default::default()
        };
        registry.init("", "", &config).unwrap();
        assert!(registry.is_active());
        assert_eq!(registry.config().unwrap().env_name, "local");
    }

    #[test]
    fn test_init_disabled() {
        let registry = Registry::new();
        let config = StatterConfig {
            disabled: true,
            agent: "whatever".into(),
            ..Default::default()
        };
        registry.init_with_config(&config).unwrap();
        assert!(!registry.is_active());
        assert!(registry.active().unwrap().is_inert());
    }

    #[test]
    fn test_init_unsupported_agent() {
        let registry = Registry::new();
        let config = StatterConfig {
            agent: "graphite".into(),
            ..Default::default()
        };
        let err = registry.init_with_config(&config).unwrap_err();
        assert!(matches!(err, MetricsError::UnsupportedAgent(_)));
        assert!(!registry.is_active());
    }

    #[test]
    fn test_init_sink_failure_is_wrapped() {
        let registry = Registry::new();
        let err = registry.init("no-port-here", "app", &datadog()).unwrap_err();
        assert!(matches!(err, MetricsError::SinkInit(_)));
        assert!(err.to_string().starts_with("statsd init failed"));
    }

    #[test]
    fn test_init_datadog_with_tracing_and_profiling() {
        let profiler = Arc::new(StubProfiler::default());
        let tracer = Arc::new(StubTracer::default());
        let registry = Registry::builder()
            .profiler(profiler.clone())
            .tracer(tracer.clone())
            .build();

        let config = StatterConfig {
            env_name: "prod".into(),
            host_name: "node-1".into(),
            version: "1.2.3".into(),
            tracing_enabled: true,
            profiling_enabled: true,
            ..datadog()
        };
        registry.init("127.0.0.1:8125", "api", &config).unwrap();

        assert!(registry.is_active());
        assert!(registry.active().unwrap().tracer().is_some());
        let started = profiler.started.lock().unwrap().clone();
        assert_eq!(
            started,
            vec![ProfilerSettings {
                service: "api".into(),
                env: "prod".into(),
                version: "1.2.3".into(),
                hostname: "node-1".into(),
            }]
        );

        registry.close();
        assert_eq!(tracer.shutdowns.load(Ordering::SeqCst), 1);
        assert!(!registry.is_active());
    }

    #[test]
    fn test_telegraf_ignores_tracing_flag() {
        let registry = Registry::new();
        let config = StatterConfig {
            agent: "telegraf".into(),
            tracing_enabled: true,
            ..Default::default()
        };
        registry.init_with_config(&config).unwrap();
        assert!(registry.active().unwrap().tracer().is_none());
    }

    #[test]
    fn test_profiler_failure_is_reported() {
        let registry = Registry::builder()
            .profiler(Arc::new(StubProfiler {
                fail: true,
                ..Default::default()
            }))
            .build();
        let config = StatterConfig {
            profiling_enabled: true,
            ..datadog()
        };
        let err = registry.init_with_config(&config).unwrap_err();
        assert!(matches!(err, MetricsError::Profiler(_)));
    }

    #[test]
    fn test_replacing_closes_previous_sink() {
        let registry = Registry::new();
        let first = Arc::new(RecordingSink::new());
        registry.with_sink(first.clone(), &StatterConfig::default());
        registry.with_sink(Arc::new(RecordingSink::new()), &StatterConfig::default());

        let calls = first.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Close);
    }

    #[test]
    fn test_close_twice() {
        let registry = Registry::new();
        let sink = Arc::new(RecordingSink::new());
        registry.with_sink(sink.clone(), &StatterConfig::default());
        registry.close();
        registry.close();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = Registry::new();
        let clone = registry.clone();
        registry.with_sink(Arc::new(RecordingSink::new()), &StatterConfig::default());
        assert!(clone.is_active());
    }
}
