//! Configuration loading from disk and process environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the primary environment base address.
pub const ENV_PRIMARY_URL: &str = "GATEWAY_PRIMARY_URL";
/// Overrides the secondary environment base address.
pub const ENV_SECONDARY_URL: &str = "GATEWAY_SECONDARY_URL";
/// Overrides the full listener bind address.
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
/// Overrides only the listener port.
pub const ENV_PORT: &str = "PORT";
/// Overrides the log format (`pretty` or `json`).
pub const ENV_LOG_FORMAT: &str = "GATEWAY_LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {reason}")]
    Override { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        primary = %config.environments.primary.base_url,
        secondary = %config.environments.secondary.base_url,
        "Configuration resolved"
    );
    Ok(config)
}

fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply overrides looked up through `lookup`.
///
/// Takes a lookup function instead of reading `std::env` directly so the
/// precedence rules stay testable.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_PRIMARY_URL) {
        config.environments.primary.base_url = url;
    }
    if let Some(url) = lookup(ENV_SECONDARY_URL) {
        config.environments.secondary.base_url = url;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(port) = lookup(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Override {
            var: ENV_PORT,
            reason: format!("'{}' is not a port number", port),
        })?;
        let mut addr: SocketAddr =
            config
                .listener
                .bind_address
                .parse()
                .map_err(|_| ConfigError::Override {
                    var: ENV_PORT,
                    reason: format!(
                        "bind address '{}' is not a socket address",
                        config.listener.bind_address
                    ),
                })?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.observability.log_format = format
            .parse()
            .map_err(|reason| ConfigError::Override {
                var: ENV_LOG_FORMAT,
                reason,
            })?;
    }
    Ok(())
}
