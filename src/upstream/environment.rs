//! Backend environment abstraction.
//!
//! # Responsibilities
//! - Represent one candidate backend deployment (name, base address, priority)
//! - Build target URLs by appending an inbound path to the base address
//! - Hold the fixed primary/secondary pair in priority order

use std::fmt;

use url::Url;

use crate::config::schema::{EnvironmentConfig, EnvironmentsConfig};
use crate::config::validation::ValidationError;

/// Position of an environment in the ownership check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Checked first (on-premises, expected to own most users).
    Primary,
    /// Checked only after the primary denies ownership.
    Secondary,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Primary => write!(f, "primary"),
            Priority::Secondary => write!(f, "secondary"),
        }
    }
}

/// A named backend target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: String,
    base_url: Url,
    priority: Priority,
}

impl Environment {
    pub fn new(name: impl Into<String>, base_url: Url, priority: Priority) -> Self {
        Self {
            name: name.into(),
            base_url,
            priority,
        }
    }

    fn from_config(config: &EnvironmentConfig, priority: Priority) -> Result<Self, ValidationError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ValidationError::InvalidBaseUrl {
            name: config.name.clone(),
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(config.name.clone(), base_url, priority))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// `{base}{path_and_query}`, with the base's trailing slash dropped so
    /// the inbound path is appended unchanged.
    pub fn url_for(&self, path_and_query: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path_and_query.starts_with('/') {
            format!("{}{}", base, path_and_query)
        } else {
            format!("{}/{}", base, path_and_query)
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.base_url)
    }
}

/// The two environments, immutable after startup.
#[derive(Debug, Clone)]
pub struct Environments {
    primary: Environment,
    secondary: Environment,
}

impl Environments {
    pub fn new(primary: Environment, secondary: Environment) -> Self {
        Self { primary, secondary }
    }

    pub fn from_config(config: &EnvironmentsConfig) -> Result<Self, ValidationError> {
        Ok(Self::new(
            Environment::from_config(&config.primary, Priority::Primary)?,
            Environment::from_config(&config.secondary, Priority::Secondary)?,
        ))
    }

    pub fn primary(&self) -> &Environment {
        &self.primary
    }

    pub fn secondary(&self) -> &Environment {
        &self.secondary
    }

    /// Environments in the order ownership must be checked.
    pub fn in_priority_order(&self) -> [&Environment; 2] {
        [&self.primary, &self.secondary]
    }
}
