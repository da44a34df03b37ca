//! User identity extraction.
//!
//! # Responsibilities
//! - Find the identity that decides which environment owns the request
//! - Apply a fixed precedence: JSON body `email`, then `?email=`, then `x-user-email`
//!
//! # Design Decisions
//! - A body that is not JSON (or not an object) just skips the body source
//! - Only non-empty strings count; nothing is synthesized or defaulted

use std::fmt;

use serde_json::Value;

use crate::http::request::RoutingRequest;

/// Field and query parameter name carrying the identity.
pub const IDENTITY_FIELD: &str = "email";

/// Header carrying the identity.
pub const IDENTITY_HEADER: &str = "x-user-email";

/// The user-identifying string used to decide ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an identity was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Body,
    Query,
    Header,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::Body => "body",
            IdentitySource::Query => "query",
            IdentitySource::Header => "header",
        }
    }
}

/// Extract the identity, or `None` when no source carries one.
pub fn extract_identity(req: &RoutingRequest) -> Option<Identity> {
    extract_identity_with_source(req).map(|(identity, _)| identity)
}

/// Like [`extract_identity`], also reporting which source won.
pub fn extract_identity_with_source(req: &RoutingRequest) -> Option<(Identity, IdentitySource)> {
    from_body(req)
        .map(|v| (v, IdentitySource::Body))
        .or_else(|| from_query(req).map(|v| (v, IdentitySource::Query)))
        .or_else(|| from_header(req).map(|v| (v, IdentitySource::Header)))
        .map(|(value, source)| (Identity(value), source))
}

fn from_body(req: &RoutingRequest) -> Option<String> {
    if req.body().is_empty() {
        return None;
    }
    let value: Value = serde_json::from_slice(req.body()).ok()?;
    match value.get(IDENTITY_FIELD)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn from_query(req: &RoutingRequest) -> Option<String> {
    url::form_urlencoded::parse(req.query()?.as_bytes())
        .find(|(key, _)| key == IDENTITY_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn from_header(req: &RoutingRequest) -> Option<String> {
    req.headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
