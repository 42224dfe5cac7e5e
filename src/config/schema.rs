//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the request guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Credential verification settings.
    pub auth: AuthConfig,

    /// Per-endpoint-class rate budgets.
    pub rate_limit: RateLimitConfig,

    /// Payload limits, origin denylist, signature scanning.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Credential verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify bearer credentials.
    pub signing_secret: String,

    /// Lifetime of issued credentials in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: "dev-only-signing-secret".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

/// A single rate budget: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RateBudget {
    pub window_secs: u64,
    pub max_requests: u32,
}

/// Rate limiting configuration, one budget per endpoint class.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Master switch; when false no request is counted.
    pub enabled: bool,

    /// Paths exempt from counting entirely (health checks).
    pub exempt_paths: Vec<String>,

    /// Authentication attempts: narrow window, low ceiling.
    pub auth: RateBudget,

    /// Password reset: wide window, very low ceiling.
    pub password_reset: RateBudget,

    /// General API traffic: wide window, high ceiling.
    pub general: RateBudget,

    /// Search: narrow window, moderate ceiling.
    pub search: RateBudget,

    /// Order creation: moderate window, very low ceiling.
    pub order_create: RateBudget,

    /// Review submission: wide window, low ceiling.
    pub review: RateBudget,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempt_paths: vec!["/health".to_string()],
            auth: RateBudget {
                window_secs: 15 * 60,
                max_requests: 10,
            },
            password_reset: RateBudget {
                window_secs: 60 * 60,
                max_requests: 3,
            },
            general: RateBudget {
                window_secs: 15 * 60,
                max_requests: 1000,
            },
            search: RateBudget {
                window_secs: 60,
                max_requests: 30,
            },
            order_create: RateBudget {
                window_secs: 10 * 60,
                max_requests: 5,
            },
            review: RateBudget {
                window_secs: 60 * 60,
                max_requests: 10,
            },
        }
    }
}

/// Payload limits, origin denylist, signature scanning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Client addresses rejected outright with 403.
    pub denied_origins: Vec<String>,

    /// Enable attack-signature scanning of request content.
    pub signature_scan: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            denied_origins: Vec::new(),
            signature_scan: true,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose a Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the metrics exporter.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
