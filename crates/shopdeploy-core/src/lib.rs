//! HTTP plumbing shared by ShopDeploy services.
//!
//! Response envelope, health handlers, request-id middleware, serde helpers
//! and tracing initialisation.

pub mod envelope;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
