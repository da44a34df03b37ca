//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → request.rs (request ID, RoutingRequest snapshot)
//!     → [gateway pipeline picks the owning environment and forwards]
//!     → response.rs (relay backend response) or error envelope
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RoutingRequest, X_REQUEST_ID};
pub use server::HttpServer;
