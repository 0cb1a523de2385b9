//! StatsD metrics client with function instrumentation.
//!
//! # Data Flow
//! ```text
//! application code
//!     → Registry (reports.rs, instrument/)
//!     → tags rendered in the agent's style
//!     → StatsSink (UDP StatsD, logging mock, no-op, recording)
//! ```
//!
//! ```no_run
//! use statter::{tags, Registry, StatterConfig};
//!
//! # fn run() -> Result<(), statter::MetricsError> {
//! let registry = Registry::new();
//! registry.init("127.0.0.1:8125", "api", &StatterConfig::default())?;
//!
//! registry.counter("orders.created", 1, &tags! { "market" => "spot" });
//! let result = registry.instrument(statter::func_name!(), &tags! {}, || {
//!     Ok::<_, std::io::Error>(42)
//! });
//! registry.close();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod instrument;
pub mod observability;
pub mod reports;
pub mod sink;
pub mod tags;

pub use client::{ClientState, Registry, RegistryBuilder};
pub use config::{Agent, StatterConfig};
pub use error::{MetricsError, SinkError};
pub use instrument::{FuncCall, FuncTimer};
pub use reports::{Timing, TimingWithErr};
pub use sink::StatsSink;
pub use tags::{bool_tag, int_tag, Integer, Tags};
