//! Gateway error taxonomy and the JSON error envelope.
//!
//! Every request ends in exactly one of two ways: a relayed backend response
//! or one of these errors rendered as `{"error", "status", "message"}`.
//! That includes failures raised before the pipeline runs (body limit,
//! request deadline).
//! A backend answering 4xx/5xx is not an error and never reaches this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that terminate a request inside the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No identity in the JSON body, query string, or `x-user-email` header.
    #[error("no user identity in request")]
    MissingIdentity,

    /// An environment could not be asked whether it owns the identity.
    #[error("ownership check against '{environment}' failed: {reason}")]
    OwnershipCheckFailed { environment: String, reason: String },

    /// Every environment answered that it does not own the identity.
    #[error("user not found in any environment")]
    UserNotFound,

    /// The forwarded call did not produce a response.
    #[error("forward to '{environment}' failed: {reason}")]
    UpstreamUnreachable { environment: String, reason: String },

    /// The inbound body exceeds `limits.max_body_bytes`.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The inbound body could not be read (e.g. the client aborted the upload).
    #[error("request body unreadable: {0}")]
    UnreadableBody(String),

    /// The whole request exceeded `timeouts.request_ms`.
    #[error("request exceeded {0}ms")]
    RequestTimeout(u64),

    /// Middleware failure other than the request deadline.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Wire shape of a synthesized error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: &'static str,
    pub status: u16,
    pub message: &'static str,
}

impl GatewayError {
    /// HTTP status emitted for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingIdentity => StatusCode::BAD_REQUEST,
            GatewayError::OwnershipCheckFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UserNotFound => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind, used as the envelope `error` field and as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MissingIdentity => "missing_identity",
            GatewayError::OwnershipCheckFailed { .. } => "ownership_check_failed",
            GatewayError::UserNotFound => "user_not_found",
            GatewayError::UpstreamUnreachable { .. } => "upstream_unreachable",
            GatewayError::PayloadTooLarge { .. } => "payload_too_large",
            GatewayError::UnreadableBody(_) => "unreadable_body",
            GatewayError::RequestTimeout(_) => "request_timeout",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Caller-facing message. Transport details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::MissingIdentity => {
                "Missing user email: provide it in the JSON body, the 'email' query parameter, or the x-user-email header"
            }
            GatewayError::OwnershipCheckFailed { .. } => {
                "Could not verify which environment owns this user"
            }
            GatewayError::UserNotFound => "User does not exist in any environment",
            GatewayError::UpstreamUnreachable { .. } => "The selected backend could not be reached",
            GatewayError::PayloadTooLarge { .. } => "Request body is too large",
            GatewayError::UnreadableBody(_) => "Request body could not be read",
            GatewayError::RequestTimeout(_) => "Request took too long to complete",
            GatewayError::Internal(_) => "Internal gateway error",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.kind(),
            status: self.status().as_u16(),
            message: self.public_message(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}
