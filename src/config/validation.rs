//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, ceilings > 0, body cap > 0)
//! - Reject unusable credential secrets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{GuardConfig, RateBudget};

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration, collecting every failure.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".into(),
            message: "not a valid socket address".into(),
        });
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "listener.request_timeout_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    if config.auth.signing_secret.len() < 16 {
        errors.push(ValidationError {
            field: "auth.signing_secret".into(),
            message: "must be at least 16 bytes".into(),
        });
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError {
            field: "auth.token_ttl_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    let budgets = [
        ("rate_limit.auth", &config.rate_limit.auth),
        ("rate_limit.password_reset", &config.rate_limit.password_reset),
        ("rate_limit.general", &config.rate_limit.general),
        ("rate_limit.search", &config.rate_limit.search),
        ("rate_limit.order_create", &config.rate_limit.order_create),
        ("rate_limit.review", &config.rate_limit.review),
    ];
    for (name, budget) in budgets {
        check_budget(name, budget, &mut errors);
    }

    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "security.max_body_bytes".into(),
            message: "must be greater than zero".into(),
        });
    }

    for origin in &config.security.denied_origins {
        if origin.parse::<std::net::IpAddr>().is_err() {
            errors.push(ValidationError {
                field: "security.denied_origins".into(),
                message: format!("'{origin}' is not a valid IP address"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_budget(name: &str, budget: &RateBudget, errors: &mut Vec<ValidationError>) {
    if budget.window_secs == 0 {
        errors.push(ValidationError {
            field: format!("{name}.window_secs"),
            message: "must be greater than zero".into(),
        });
    }
    if budget.max_requests == 0 {
        errors.push(ValidationError {
            field: format!("{name}.max_requests"),
            message: "must be greater than zero".into(),
        });
    }
}
