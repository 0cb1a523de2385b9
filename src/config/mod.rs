//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StatterConfig
//!     → Registry::init (normalize, build sink)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Normalization (clamping, env default) happens at init, so configs
//!   built in code get the same treatment as loaded ones

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{Agent, StatterConfig};
pub use validation::{validate_config, ValidationError};
