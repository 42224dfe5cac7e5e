//! Fixed-order request pipeline.
//!
//! Per route class the ordering is: origin denylist → size cap → sanitizer →
//! signature scan (non-blocking) → rate limiter → principal resolver →
//! role/verification gates → validator → handler. The first rejecting
//! component terminates the chain; later components never execute.
//!
//! The ordering is deliberate: sanitize before anything inspects content,
//! rate-limit before paying for the principal and revocation lookups,
//! validate last so rule sets may depend on the resolved role.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::Value;

use crate::auth::resolver::{gate_role, gate_verified, AuthContext, AuthMode, Resolver};
use crate::http::response::Reject;
use crate::observability::metrics;
use crate::pipeline::{SanitizedBody, SanitizedQuery};
use crate::ratelimit::{Decision, EndpointClass, RateLimiter};
use crate::sanitize::Sanitizer;
use crate::security::{AuditLog, RequestOutcome, SecurityAlert, SignatureScanner};
use crate::validate::{FieldError, RuleSet, Validator};

/// Strongly-typed per-route-class policy, enumerated at startup.
#[derive(Clone)]
pub struct RoutePolicy {
    pub name: &'static str,
    pub class: EndpointClass,
    pub auth: AuthMode,
    pub require_admin: bool,
    pub require_verified: bool,
    pub rules: Option<RuleSet>,
}

impl RoutePolicy {
    pub fn new(name: &'static str, class: EndpointClass) -> Self {
        Self {
            name,
            class,
            auth: AuthMode::Disabled,
            require_admin: false,
            require_verified: false,
            rules: None,
        }
    }

    pub fn auth(mut self, mode: AuthMode) -> Self {
        self.auth = mode;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.auth = AuthMode::Required;
        self.require_admin = true;
        self
    }

    pub fn verified_only(mut self) -> Self {
        self.require_verified = true;
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }
}

/// Shared state injected into the guard middleware.
#[derive(Clone)]
pub struct GuardState {
    pub sanitizer: Arc<Sanitizer>,
    pub validator: Arc<Validator>,
    pub scanner: Arc<SignatureScanner>,
    pub limiter: Arc<RateLimiter>,
    pub resolver: Arc<Resolver>,
    pub audit: AuditLog,
    pub max_body_bytes: usize,
    pub denied_origins: Arc<Vec<IpAddr>>,
    pub signature_scan: bool,
}

/// The guard middleware: one deterministic admit/reject/degrade decision
/// per request, before the business handler runs.
pub async fn guard(
    State(state): State<GuardState>,
    Extension(policy): Extension<Arc<RoutePolicy>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let origin = addr.ip();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let mut decision: Option<Decision> = None;
    let mut flagged = false;
    let mut identity = origin.to_string();

    let outcome = enforce(
        &state,
        &policy,
        origin,
        &path,
        request,
        &mut decision,
        &mut flagged,
        &mut identity,
    )
    .await;

    let mut response = match outcome {
        Ok(request) => next.run(request).await,
        Err(reject) => {
            tracing::debug!(
                request_id = %request_id,
                route = policy.name,
                reason = reject.reason(),
                client = %identity,
                "Request rejected"
            );
            metrics::record_rejection(reject.reason());
            reject.into_response()
        }
    };

    attach_rate_headers(&mut response, decision);

    let status = response.status().as_u16();
    metrics::record_decision(policy.class.as_str(), status, started);

    // Completion logging stays off the critical path: the record is handed
    // to the audit channel and written by the drain task.
    if status >= 400 || flagged {
        state.audit.outcome(RequestOutcome {
            request_id,
            method,
            path,
            status,
            identity,
            elapsed_ms: started.elapsed().as_millis(),
            flagged,
        });
    }

    response
}

/// Run every enforcement component in order; first failure wins.
#[allow(clippy::too_many_arguments)]
async fn enforce(
    state: &GuardState,
    policy: &RoutePolicy,
    origin: IpAddr,
    path: &str,
    request: Request<Body>,
    decision: &mut Option<Decision>,
    flagged: &mut bool,
    identity: &mut String,
) -> Result<Request<Body>, Reject> {
    if state.denied_origins.contains(&origin) {
        return Err(Reject::ForbiddenOrigin);
    }

    let (mut parts, raw_body) = request.into_parts();

    let bytes = axum::body::to_bytes(raw_body, state.max_body_bytes)
        .await
        .map_err(|_| Reject::PayloadTooLarge)?;

    let mut body: Option<Value> = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).map_err(|_| {
            Reject::ValidationFailed(vec![FieldError {
                field: "body".to_string(),
                message: "must be valid JSON".to_string(),
            }])
        })?)
    };

    let mut query = parse_query(parts.uri.query().unwrap_or(""));

    // Sanitize before any other component observes the content.
    if let Some(body) = body.as_mut() {
        state.sanitizer.clean_value(body);
    }
    state.sanitizer.clean_query(&mut query);

    if state.signature_scan {
        if let Some(signature) = state.scanner.scan_request(path, &query, body.as_ref()) {
            *flagged = true;
            let content = body
                .as_ref()
                .map(|b| b.to_string())
                .unwrap_or_else(|| format!("{path}?{query:?}"));
            state
                .audit
                .alert(SecurityAlert::new(signature, identity, path, &content));
        }
    }

    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Count the request before the store and revocation lookups. The
    // identity fragment is the subject of a signature-valid credential; a
    // request without one is keyed by origin alone, so forged subjects
    // cannot split the counting key.
    if state.limiter.enabled() && !state.limiter.is_exempt(path) {
        let fragment = state.resolver.verified_subject(authorization.as_deref());
        let d = state
            .limiter
            .check(policy.class, origin, fragment.as_deref())
            .await;
        *decision = Some(d);
        if !d.admitted {
            metrics::record_rate_limited(policy.class.as_str());
            return Err(Reject::RateLimited {
                retry_after: d.resets_in.as_secs().max(1),
            });
        }
    }

    let context: Option<AuthContext> = match policy.auth {
        AuthMode::Disabled => None,
        AuthMode::Required => Some(state.resolver.resolve(authorization.as_deref()).await?),
        AuthMode::Optional => state.resolver.resolve(authorization.as_deref()).await.ok(),
    };

    if let Some(context) = context {
        gate_role(&context, policy.require_admin)?;
        gate_verified(&context, policy.require_verified)?;
        *identity = context.principal.id.clone();
        parts.extensions.insert(context);
    }

    if let Some(rules) = &policy.rules {
        let errors = state
            .validator
            .evaluate(rules, body.as_ref().unwrap_or(&Value::Null));
        if !errors.is_empty() {
            return Err(Reject::ValidationFailed(errors));
        }
    }

    // Rebuild the request around the sanitized content.
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.extensions.insert(SanitizedQuery(query));
    let body_bytes = match &body {
        Some(value) => {
            parts.extensions.insert(SanitizedBody(value.clone()));
            serde_json::to_vec(value).unwrap_or_default()
        }
        None => Vec::new(),
    };

    Ok(Request::from_parts(parts, Body::from(body_bytes)))
}

/// Rate budget metadata is reported on every response, admitted or not.
fn attach_rate_headers(response: &mut Response, decision: Option<Decision>) {
    let Some(decision) = decision else {
        return;
    };
    let headers = response.headers_mut();
    let pairs = [
        ("x-ratelimit-limit", decision.limit.to_string()),
        ("x-ratelimit-remaining", decision.remaining.to_string()),
        ("x-ratelimit-reset", decision.resets_in.as_secs().to_string()),
    ];
    for (name, value) in pairs {
        if let Ok(value) = value.parse() {
            headers.insert(
                axum::http::header::HeaderName::from_static(name),
                value,
            );
        }
    }
}

/// Minimal query-string parsing with percent decoding.
fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        query.insert(percent_decode(key), percent_decode(value));
    }
    query
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 3 <= bytes.len() => {
                match hex_val(bytes[i + 1]).zip(hex_val(bytes[i + 2])) {
                    Some((hi, lo)) => {
                        out.push(hi * 16 + lo);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
