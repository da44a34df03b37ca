//! Header filtering for both legs of a proxied call.
//!
//! # Responsibilities
//! - Reduce inbound headers to an explicit allow-list before forwarding
//! - Strip hop-by-hop headers from a relayed backend response
//!
//! # Design Decisions
//! - Allow-list, not deny-list: `host` and connection-management headers
//!   from the inbound leg are never valid on the outbound leg
//! - Multi-valued headers keep every value in received order

use axum::http::header::{self, HeaderMap, HeaderName};

use crate::routing::identity::IDENTITY_HEADER;

/// Correlation header propagated to backends.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Inbound headers that may be forwarded.
pub fn forwarded_header_names() -> [HeaderName; 5] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(IDENTITY_HEADER),
        HeaderName::from_static(X_CORRELATION_ID),
        HeaderName::from_static("x-request-id"),
    ]
}

/// Headers that describe a single connection and must not be relayed.
fn hop_by_hop_header_names() -> [HeaderName; 7] {
    [
        header::CONNECTION,
        HeaderName::from_static("keep-alive"),
        HeaderName::from_static("proxy-connection"),
        header::TRANSFER_ENCODING,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
    ]
}

/// Copy only allow-listed headers. Absent ones are omitted.
pub fn filter_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for name in forwarded_header_names() {
        for value in inbound.get_all(&name) {
            outbound.append(name.clone(), value.clone());
        }
    }
    outbound
}

/// Remove hop-by-hop headers in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in hop_by_hop_header_names() {
        headers.remove(&name);
    }
}
