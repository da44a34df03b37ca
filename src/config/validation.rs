//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate environment base addresses (scheme, host, no query)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{EnvironmentConfig, GatewayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("environment '{slot}': name must not be empty")]
    EmptyEnvironmentName { slot: &'static str },

    #[error("environments must have distinct names, both are '{0}'")]
    DuplicateEnvironmentName(String),

    #[error("environment '{name}': invalid base_url '{url}': {reason}")]
    InvalidBaseUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_ms ({request_ms}) must cover two ownership checks and a forward ({required})")]
    RequestTimeoutTooShort { request_ms: u64, required: u64 },

    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let primary = &config.environments.primary;
    let secondary = &config.environments.secondary;
    validate_environment("primary", primary, &mut errors);
    validate_environment("secondary", secondary, &mut errors);
    if !primary.name.is_empty() && primary.name == secondary.name {
        errors.push(ValidationError::DuplicateEnvironmentName(primary.name.clone()));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("check_ms", timeouts.check_ms),
        ("forward_ms", timeouts.forward_ms),
        ("request_ms", timeouts.request_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }
    let required = timeouts
        .check_ms
        .saturating_mul(2)
        .saturating_add(timeouts.forward_ms);
    if timeouts.request_ms != 0 && timeouts.request_ms < required {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_ms: timeouts.request_ms,
            required,
        });
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_environment(
    slot: &'static str,
    env: &EnvironmentConfig,
    errors: &mut Vec<ValidationError>,
) {
    if env.name.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironmentName { slot });
    }

    let invalid = |reason: String| ValidationError::InvalidBaseUrl {
        name: env.name.clone(),
        url: env.base_url.clone(),
        reason,
    };

    match Url::parse(&env.base_url) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") {
                errors.push(invalid(format!("unsupported scheme '{}'", url.scheme())));
            }
            if url.host_str().is_none() {
                errors.push(invalid("missing host".to_string()));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(invalid("query and fragment are not allowed".to_string()));
            }
        }
        Err(e) => errors.push(invalid(e.to_string())),
    }
}
