//! Pipeline composition.
//!
//! # Data Flow
//! ```text
//! raw request
//!     → sanitizer (rewrite body + query in place)
//!     → signature scan (alert only, never blocks)
//!     → rate limiter (cheap rejection first)
//!     → principal resolver (if the route wants identity)
//!     → role / verification gates
//!     → validator
//!     → business handler
//! ```
//!
//! # Design Decisions
//! - One middleware executes the whole sequence so ordering is a property
//!   of code, not of layer registration
//! - Route policies are static structs resolved at router build time

pub mod composer;

use std::collections::HashMap;

use serde_json::Value;

pub use composer::{guard, GuardState, RoutePolicy};

/// Sanitized JSON body, attached for handler consumption.
#[derive(Debug, Clone)]
pub struct SanitizedBody(pub Value);

/// Sanitized query parameters, attached for handler consumption.
#[derive(Debug, Clone)]
pub struct SanitizedQuery(pub HashMap<String, String>);
