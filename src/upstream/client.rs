//! Outbound HTTP client construction.
//!
//! Two clients: reqwest for the JSON `/checkUser` calls, and a bare hyper
//! client for the forward leg, which must send exactly the filtered headers
//! (reqwest injects `accept: */*` when the header is absent).

use std::time::Duration;

use axum::body::Body;
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::schema::OutboundConfig;

/// Client used to re-issue inbound requests (http and https targets).
pub type ForwardClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the client used for ownership checks.
///
/// Redirects are never followed. Per-call deadlines are applied on each request.
pub fn build_check_client(config: &OutboundConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

/// Build the forwarding client.
///
/// Adds no headers of its own besides `host` and body framing, and never
/// follows redirects: a backend 3xx is relayed like any other status.
pub fn build_forward_client() -> Result<ForwardClient, native_tls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let tls = tokio_native_tls::TlsConnector::from(native_tls::TlsConnector::new()?);
    let https = HttpsConnector::from((http, tls));

    Ok(Client::builder(TokioExecutor::new()).build(https))
}

/// Short reason for a failed ownership check, for logs and error context.
pub fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("timed out after {}ms", timeout.as_millis())
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_decode() || err.is_body() {
        format!("malformed response: {}", err)
    } else {
        err.to_string()
    }
}
