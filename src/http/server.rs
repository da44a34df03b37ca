//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all gateway handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener with graceful shutdown
//! - Turn each request into exactly one response: relayed or error envelope

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    error_handling::HandleErrorLayer,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    http::{HeaderMap, Method, Request, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{Gateway, GatewayBuildError};
use crate::http::request::{request_id, MakeRequestUuid, RoutingRequest, X_REQUEST_ID};
use crate::http::response::relay;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayBuildError> {
        let gateway = Arc::new(Gateway::from_config(&config)?);
        let state = AppState {
            gateway,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let request_ms = config.timeouts.request_ms;
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request_id(req.headers()),
                    )
                }),
            )
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                middleware_error(err, request_ms)
            }))
            .layer(TimeoutLayer::new(Duration::from_millis(request_ms)));

        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            primary = %self.config.environments.primary.base_url,
            secondary = %self.config.environments.secondary.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: any method, any path.
async fn gateway_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let method_str = method.to_string();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                GatewayError::PayloadTooLarge {
                    limit: state.max_body_bytes,
                }
            } else {
                GatewayError::UnreadableBody(rejection.body_text())
            };
            tracing::info!(request_id = %request_id(&headers), kind = err.kind(), error = %err, "Request rejected");
            metrics::record_request(&method_str, err.status().as_u16(), "none", start_time);
            return err.into_response();
        }
    };

    let request = RoutingRequest::new(method, uri, headers, body);

    tracing::debug!(
        request_id = %request.request_id(),
        method = %method_str,
        path = %request.path_and_query(),
        "Routing request"
    );

    match state.gateway.route(&request).await {
        Ok(routed) => {
            metrics::record_request(
                &method_str,
                routed.response.status.as_u16(),
                &routed.environment,
                start_time,
            );
            relay(routed.response)
        }
        Err(err) => {
            if err.status().is_server_error() {
                tracing::error!(request_id = %request.request_id(), kind = err.kind(), error = %err, "Request failed");
            } else {
                tracing::info!(request_id = %request.request_id(), kind = err.kind(), error = %err, "Request rejected");
            }
            metrics::record_request(&method_str, err.status().as_u16(), "none", start_time);
            err.into_response()
        }
    }
}

/// Render errors raised by the middleware stack as gateway envelopes.
fn middleware_error(err: BoxError, request_ms: u64) -> Response {
    let err = if err.is::<Elapsed>() {
        GatewayError::RequestTimeout(request_ms)
    } else {
        GatewayError::Internal(err.to_string())
    };
    tracing::warn!(kind = err.kind(), error = %err, "Request aborted by middleware");
    err.into_response()
}
