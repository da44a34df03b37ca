//! Upstream (backend environment) subsystem.
//!
//! # Data Flow
//! ```text
//! Environments (built once from config, primary then secondary)
//!     → client.rs (reqwest for checks, hyper for forwards; no redirects)
//!     → routing::ownership (POST /checkUser against each environment)
//!     → forwarder.rs (re-issue the inbound request to the owner)
//!     → BackendResponse (status, headers, body; never interpreted)
//! ```
//!
//! # Design Decisions
//! - Exactly two environments, fixed at startup
//! - One attempt per call, no retries
//! - Backend 4xx/5xx are successful forwards

pub mod client;
pub mod environment;
pub mod forwarder;

pub use environment::{Environment, Environments, Priority};
pub use forwarder::{BackendResponse, Forwarder};
