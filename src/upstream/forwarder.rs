//! Request forwarding to the owning environment.
//!
//! # Responsibilities
//! - Re-issue method, path+query, filtered headers and body against
//!   `{environment.base_url}{path}`
//! - Capture the raw response without reinterpreting it
//!
//! # Design Decisions
//! - Single attempt; a transport failure or timeout becomes `UpstreamUnreachable`
//! - The outbound header set is exactly the filtered one (plus `host` and framing)
//! - An empty inbound body is sent as an empty body

use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use tokio::time;

use crate::error::GatewayError;
use crate::http::request::RoutingRequest;
use crate::upstream::client::ForwardClient;
use crate::upstream::environment::Environment;

/// A backend's answer, relayed as-is.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Issues the forwarded call.
#[derive(Clone)]
pub struct Forwarder {
    client: ForwardClient,
    timeout: Duration,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Forwarder {
    pub fn new(client: ForwardClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Forward `request` to `environment` with the given (already filtered) headers.
    pub async fn forward(
        &self,
        environment: &Environment,
        request: &RoutingRequest,
        headers: HeaderMap,
    ) -> Result<BackendResponse, GatewayError> {
        let url = environment.url_for(request.path_and_query());
        let unreachable = |reason: String| GatewayError::UpstreamUnreachable {
            environment: environment.name().to_string(),
            reason,
        };

        tracing::debug!(
            request_id = %request.request_id(),
            environment = %environment.name(),
            method = %request.method(),
            url = %url,
            "Forwarding request"
        );

        let uri: Uri = url
            .parse()
            .map_err(|e| unreachable(format!("invalid target uri '{}': {}", url, e)))?;
        let mut outbound = Request::builder()
            .method(request.method().clone())
            .uri(uri)
            .body(Body::from(request.body().clone()))
            .map_err(|e| unreachable(e.to_string()))?;
        *outbound.headers_mut() = headers;

        let exchange = async {
            let response = self
                .client
                .request(outbound)
                .await
                .map_err(|e| {
                    if e.is_connect() {
                        format!("connection failed: {}", e)
                    } else {
                        e.to_string()
                    }
                })?;
            let (parts, body) = response.into_parts();
            let body = to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(|e| format!("malformed response: {}", e))?;
            Ok::<_, String>(BackendResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        match time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(unreachable),
            Err(_) => Err(unreachable(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
