//! Response relay.
//!
//! # Responsibilities
//! - Write a captured backend response back to the caller unchanged
//! - (Gateway errors render themselves, see `crate::error`)
//!
//! # Design Decisions
//! - Headers copied value by value so multi-valued headers survive
//! - Hop-by-hop headers stripped; the body is re-framed by this server

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::Response;

use crate::security::headers::strip_hop_by_hop;
use crate::upstream::BackendResponse;

/// Build the caller-facing response from a backend response.
pub fn relay(backend: BackendResponse) -> Response {
    let mut headers = HeaderMap::with_capacity(backend.headers.len());
    for (name, value) in backend.headers.iter() {
        headers.append(name.clone(), value.clone());
    }
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from(backend.body));
    *response.status_mut() = backend.status;
    *response.headers_mut() = headers;
    response
}
