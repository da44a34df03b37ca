//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RoutingRequest (body, query, headers)
//!     → identity.rs (email from body → query → x-user-email)
//!     → ownership.rs (POST /checkUser: primary, then secondary)
//!     → Return: owning Environment, UserNotFound, or OwnershipCheckFailed
//! ```
//!
//! # Design Decisions
//! - Environments fixed at startup, immutable at runtime
//! - Deterministic: same answers from the backends always pick the same environment
//! - First affirmative match wins; no routing decision is cached

pub mod identity;
pub mod ownership;

pub use identity::{extract_identity, Identity};
pub use ownership::{OwnershipResolver, OwnershipVerdict};
