//! Rejection taxonomy and the uniform response envelope.
//!
//! # Design Decisions
//! - Every rejection is total and renders the same JSON shape; no stack
//!   traces or internal identifiers ever reach a response body
//! - All rejections are recoverable by the caller; none is fatal to the
//!   server process

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::validate::FieldError;

/// Why a request was turned away before reaching business logic.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Reject {
    #[error("credential missing or malformed")]
    MalformedCredential,

    #[error("credential expired")]
    ExpiredCredential,

    #[error("credential revoked")]
    RevokedCredential,

    #[error("unknown principal")]
    UnknownPrincipal,

    #[error("account is not active")]
    InactivePrincipal,

    #[error("insufficient role")]
    InsufficientRole,

    #[error("account is not verified")]
    Unverified,

    #[error("too many requests")]
    RateLimited { retry_after: u64 },

    #[error("validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("origin is not allowed")]
    ForbiddenOrigin,
}

impl Reject {
    pub fn status(&self) -> StatusCode {
        match self {
            Reject::MalformedCredential
            | Reject::ExpiredCredential
            | Reject::RevokedCredential
            | Reject::UnknownPrincipal
            | Reject::InactivePrincipal => StatusCode::UNAUTHORIZED,
            Reject::InsufficientRole | Reject::Unverified | Reject::ForbiddenOrigin => {
                StatusCode::FORBIDDEN
            }
            Reject::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Reject::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Reject::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Stable label for metrics and audit records.
    pub fn reason(&self) -> &'static str {
        match self {
            Reject::MalformedCredential => "malformed_credential",
            Reject::ExpiredCredential => "expired_credential",
            Reject::RevokedCredential => "revoked_credential",
            Reject::UnknownPrincipal => "unknown_principal",
            Reject::InactivePrincipal => "inactive_principal",
            Reject::InsufficientRole => "insufficient_role",
            Reject::Unverified => "unverified",
            Reject::RateLimited { .. } => "rate_limited",
            Reject::ValidationFailed(_) => "validation_failed",
            Reject::PayloadTooLarge => "payload_too_large",
            Reject::ForbiddenOrigin => "forbidden_origin",
        }
    }
}

/// Uniform envelope returned on every rejection.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,

    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for Reject {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        let (retry_after, errors) = match self {
            Reject::RateLimited { retry_after } => (Some(retry_after), None),
            Reject::ValidationFailed(errors) => (None, Some(errors)),
            _ => (None, None),
        };

        let body = Envelope {
            success: false,
            message,
            retry_after,
            errors,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
