//! Business handlers.
//!
//! Deliberately thin: the catalog, order, and review logic live in external
//! collaborators. These handlers exist to terminate the pipeline and to
//! exercise the guard in the demo binary and the integration tests.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{token, AuthContext, LifecycleState, PrincipalStore};
use crate::config::schema::AuthConfig;
use crate::http::response::Reject;
use crate::pipeline::{SanitizedBody, SanitizedQuery};

/// State for the business handlers; the guard has its own.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthConfig,
    pub principals: Arc<dyn PrincipalStore>,
}

fn field<'a>(body: &'a Option<Extension<SanitizedBody>>, name: &str) -> Option<&'a str> {
    body.as_ref()?.0 .0.get(name)?.as_str()
}

/// Issues a credential for a known, active principal.
pub async fn login(
    State(state): State<AppState>,
    body: Option<Extension<SanitizedBody>>,
) -> Response {
    let Some(email) = field(&body, "email") else {
        return Reject::UnknownPrincipal.into_response();
    };

    let Some(principal) = state.principals.find_principal_by_id(email).await else {
        return Reject::UnknownPrincipal.into_response();
    };

    if principal.state != LifecycleState::Active {
        return Reject::InactivePrincipal.into_response();
    }

    // Password verification belongs to the persistence collaborator; the
    // demo store keeps the raw comparison value in credential_hash.
    if !principal.credential_hash.is_empty()
        && field(&body, "password") != Some(principal.credential_hash.as_str())
    {
        return Reject::UnknownPrincipal.into_response();
    }

    match token::issue(&state.auth.signing_secret, &principal.id, state.auth.token_ttl_secs) {
        Ok(token) => Json(json!({
            "success": true,
            "token": token,
            "expiresIn": state.auth.token_ttl_secs,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Credential issuance failed");
            Reject::MalformedCredential.into_response()
        }
    }
}

/// Echoes the sanitized registration payload back to the caller.
pub async fn register(body: Option<Extension<SanitizedBody>>) -> Json<Value> {
    let data = body.map(|Extension(SanitizedBody(v))| v).unwrap_or(Value::Null);
    Json(json!({"success": true, "data": data}))
}

pub async fn password_reset(body: Option<Extension<SanitizedBody>>) -> Json<Value> {
    let email = field(&body, "email").unwrap_or_default().to_string();
    // Uniform reply whether or not the account exists.
    Json(json!({
        "success": true,
        "message": format!("If {email} is registered, a reset link has been sent"),
    }))
}

pub async fn search(query: Option<Extension<SanitizedQuery>>) -> Json<Value> {
    let term = query
        .as_ref()
        .and_then(|Extension(SanitizedQuery(q))| q.get("q").cloned())
        .unwrap_or_default();
    Json(json!({"success": true, "query": term, "results": []}))
}

pub async fn list_products(context: Option<Extension<AuthContext>>) -> Json<Value> {
    let greeting = context
        .map(|Extension(ctx)| format!("personalized for {}", ctx.principal.id))
        .unwrap_or_else(|| "anonymous".to_string());
    Json(json!({"success": true, "catalog": greeting, "products": []}))
}

pub async fn create_order(
    Extension(context): Extension<AuthContext>,
    body: Option<Extension<SanitizedBody>>,
) -> Json<Value> {
    let product = field(&body, "product_id").unwrap_or_default().to_string();
    Json(json!({
        "success": true,
        "orderId": Uuid::new_v4(),
        "productId": product,
        "placedBy": context.principal.id,
    }))
}

pub async fn create_review(
    Extension(context): Extension<AuthContext>,
    body: Option<Extension<SanitizedBody>>,
) -> Json<Value> {
    let product = field(&body, "product_id").unwrap_or_default().to_string();
    Json(json!({
        "success": true,
        "reviewId": Uuid::new_v4(),
        "productId": product,
        "author": context.principal.id,
    }))
}

pub async fn admin_overview(Extension(context): Extension<AuthContext>) -> Json<Value> {
    Json(json!({
        "success": true,
        "admin": context.principal.id,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
