//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the agent flavor is one we can build a sink for
//! - Check a network sink has somewhere to send
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StatterConfig → Result<(), Vec<ValidationError>>
//! - Disabled and mocked configs skip the sink checks
//! - A too-small stuck threshold is not an error; normalization clamps it

use thiserror::Error;

use crate::config::schema::{StatterConfig, MIN_STUCK_FUNCTION_TIMEOUT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported agent {0:?} (expected \"datadog\" or \"telegraf\")")]
    UnsupportedAgent(String),

    #[error("sink address is empty")]
    EmptyAddress,
}

/// Check a configuration before it is handed to a registry.
pub fn validate_config(config: &StatterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.disabled && !config.mocking_enabled {
        if config.parsed_agent().is_err() {
            errors.push(ValidationError::UnsupportedAgent(config.agent.clone()));
        }
        if config.address.trim().is_empty() {
            errors.push(ValidationError::EmptyAddress);
        }
    }

    if config.stuck_function_timeout() < MIN_STUCK_FUNCTION_TIMEOUT {
        tracing::warn!(
            stuck_function_timeout_ms = config.stuck_function_timeout_ms,
            "Stuck function timeout below minimum, default will be used"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
