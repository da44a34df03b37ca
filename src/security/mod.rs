//! Security subsystem.
//!
//! # Design Decisions
//! - Only allow-listed request headers reach a backend
//! - Request body size bounded before buffering (see `limits.max_body_bytes`)

pub mod headers;
