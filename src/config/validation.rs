//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Check the log level names a real tracing level
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the engine

use thiserror::Error;

use crate::config::schema::EngineConfig;

/// One semantic violation found in a config.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate an engine config, collecting every violation.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.loader_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "timeouts.loader_secs",
        });
    }
    if config.timeouts.action_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "timeouts.action_secs",
        });
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
