//! HTTP gateway for the Cinedex indexing pipeline.
//!
//! Exposes search and hybrid search, manual re-index triggers, an ingress
//! for domain change events and a health probe.

/// API-key guard for administrative routes.
pub mod middleware;
/// Router, shared state and handlers.
pub mod server;

pub use middleware::AuthConfig;
pub use server::{AppState, GatewayServer, MAX_LIMIT};
