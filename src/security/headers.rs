//! Hardened response headers.
//!
//! # Responsibilities
//! - Disable content-type sniffing, framing, and legacy XSS auto-protection
//! - Applied unconditionally, before any pipeline component runs, so even
//!   rejected responses carry them
//!
//! # Design Decisions
//! - Set as outermost layers on the router; handlers cannot opt out

use axum::http::{header::HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

pub fn harden(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("0"),
        ))
}
