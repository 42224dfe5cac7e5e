//! Request-defense pipeline for a multi-tenant commerce API.
//!
//! Authenticates principals, enforces per-endpoint rate budgets, neutralizes
//! injection payloads, and validates structured input before business logic
//! runs. Every request receives one deterministic decision: admit, reject,
//! or degrade to anonymous.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod ratelimit;
pub mod sanitize;
pub mod security;
pub mod validate;

pub use config::GuardConfig;
pub use http::GuardServer;
pub use lifecycle::Shutdown;
