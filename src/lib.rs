//! Identity-based routing gateway.
//!
//! Routes each inbound HTTP request to whichever of two backend environments
//! owns the caller's identity, then relays the backend response unchanged.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
