//! Per-request routing pipeline.
//!
//! ```text
//! Start
//!   → IdentityResolved      | IdentityMissing      → 400
//!   → OwnershipResolved     | OwnershipDenied      → 404
//!                           | OwnershipCheckFailed → 500
//!   → Forwarded             | ForwardFailed        → 502
//!   → Relayed
//! ```
//!
//! Nothing is kept between requests except the immutable configuration
//! captured at construction.

use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::request::RoutingRequest;
use crate::routing::identity::extract_identity_with_source;
use crate::routing::ownership::OwnershipResolver;
use crate::security::headers::filter_request_headers;
use crate::upstream::client::{build_check_client, build_forward_client};
use crate::upstream::environment::Environments;
use crate::upstream::forwarder::{BackendResponse, Forwarder};

/// Errors building a gateway from configuration.
#[derive(Debug, thiserror::Error)]
pub enum GatewayBuildError {
    #[error(transparent)]
    Environment(#[from] crate::config::validation::ValidationError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to initialize TLS: {0}")]
    Tls(#[from] native_tls::Error),
}

/// A successfully forwarded request and where it went.
#[derive(Debug)]
pub struct Routed {
    pub environment: String,
    pub response: BackendResponse,
}

/// Identity extraction, ownership resolution and forwarding, composed.
#[derive(Debug, Clone)]
pub struct Gateway {
    resolver: OwnershipResolver,
    forwarder: Forwarder,
}

impl Gateway {
    pub fn new(resolver: OwnershipResolver, forwarder: Forwarder) -> Self {
        Self {
            resolver,
            forwarder,
        }
    }

    /// Build the resolver and forwarder with their clients.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayBuildError> {
        let environments = Environments::from_config(&config.environments)?;

        let resolver = OwnershipResolver::new(
            build_check_client(&config.outbound)?,
            environments,
            Duration::from_millis(config.timeouts.check_ms),
            config.outbound.user_agent.clone(),
        );
        let forwarder = Forwarder::new(
            build_forward_client()?,
            Duration::from_millis(config.timeouts.forward_ms),
        );
        Ok(Self::new(resolver, forwarder))
    }

    pub fn resolver(&self) -> &OwnershipResolver {
        &self.resolver
    }

    /// Route one request to its owning environment.
    pub async fn route(&self, request: &RoutingRequest) -> Result<Routed, GatewayError> {
        let request_id = request.request_id();

        let (identity, source) =
            extract_identity_with_source(request).ok_or(GatewayError::MissingIdentity)?;
        tracing::debug!(
            request_id = %request_id,
            source = source.as_str(),
            "Identity resolved"
        );

        let environment = self.resolver.resolve(&identity).await?;
        tracing::info!(
            request_id = %request_id,
            environment = %environment.name(),
            priority = %environment.priority(),
            "Ownership resolved"
        );

        let headers = filter_request_headers(request.headers());
        let response = self.forwarder.forward(environment, request, headers).await?;
        tracing::debug!(
            request_id = %request_id,
            environment = %environment.name(),
            status = %response.status,
            "Forwarded"
        );

        Ok(Routed {
            environment: environment.name().to_string(),
            response,
        })
    }
}
