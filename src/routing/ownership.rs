//! Ownership resolution.
//!
//! # Responsibilities
//! - Ask each environment whether it holds an account for the identity
//! - Stop at the first environment that affirms ownership
//!
//! # Design Decisions
//! - Strictly sequential, primary first; the secondary is only asked after
//!   the primary explicitly denies
//! - Fail fast: a check that cannot be completed ends the request with
//!   `OwnershipCheckFailed` instead of falling through to the next environment
//! - Only `"exists": true` affirms; a body that is not a JSON object fails closed

use std::time::Duration;

use axum::http::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::routing::identity::Identity;
use crate::upstream::client::describe_transport_error;
use crate::upstream::environment::{Environment, Environments};

/// Path of the existence check on every environment.
pub const CHECK_USER_PATH: &str = "/checkUser";

#[derive(Debug, Serialize)]
struct CheckUserRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckUserResponse {
    #[serde(default)]
    exists: Option<Value>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

/// Answer of one environment for one identity.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipVerdict {
    /// True only when the environment answered `"exists": true`.
    pub exists: bool,
    /// Remaining response fields, opaque to the gateway.
    pub metadata: Map<String, Value>,
}

impl From<CheckUserResponse> for OwnershipVerdict {
    fn from(response: CheckUserResponse) -> Self {
        Self {
            exists: matches!(response.exists, Some(Value::Bool(true))),
            metadata: response.metadata,
        }
    }
}

/// Decode a `/checkUser` body into a verdict.
pub fn decode_verdict(body: &[u8]) -> Result<OwnershipVerdict, serde_json::Error> {
    serde_json::from_slice::<CheckUserResponse>(body).map(OwnershipVerdict::from)
}

/// Finds the environment that owns an identity.
#[derive(Debug, Clone)]
pub struct OwnershipResolver {
    client: reqwest::Client,
    environments: Environments,
    timeout: Duration,
    user_agent: String,
}

impl OwnershipResolver {
    pub fn new(
        client: reqwest::Client,
        environments: Environments,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            environments,
            timeout,
            user_agent: user_agent.into(),
        }
    }

    /// Query a single environment.
    pub async fn check(
        &self,
        environment: &Environment,
        identity: &Identity,
    ) -> Result<OwnershipVerdict, GatewayError> {
        let failed = |reason: String| GatewayError::OwnershipCheckFailed {
            environment: environment.name().to_string(),
            reason,
        };

        let response = self
            .client
            .post(environment.url_for(CHECK_USER_PATH))
            .header(USER_AGENT, self.user_agent.as_str())
            .json(&CheckUserRequest {
                email: identity.as_str(),
            })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| failed(describe_transport_error(&e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("unexpected status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| failed(describe_transport_error(&e, self.timeout)))?;

        decode_verdict(&body).map_err(|e| failed(format!("undecodable response: {}", e)))
    }

    /// Return the first environment, in priority order, that owns `identity`.
    pub async fn resolve(&self, identity: &Identity) -> Result<&Environment, GatewayError> {
        for environment in self.environments.in_priority_order() {
            let verdict = match self.check(environment, identity).await {
                Ok(verdict) => verdict,
                Err(err) => {
                    metrics::record_ownership_check(environment.name(), "failed");
                    tracing::warn!(
                        environment = %environment.name(),
                        error = %err,
                        "Ownership check failed"
                    );
                    return Err(err);
                }
            };

            if verdict.exists {
                metrics::record_ownership_check(environment.name(), "owned");
                tracing::debug!(
                    environment = %environment.name(),
                    metadata = ?verdict.metadata,
                    "Environment owns identity"
                );
                return Ok(environment);
            }

            metrics::record_ownership_check(environment.name(), "denied");
            tracing::debug!(environment = %environment.name(), "Environment denies ownership");
        }

        Err(GatewayError::UserNotFound)
    }
}
