//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with one guarded group per endpoint class
//! - Wire up middleware (hardened headers, request ID, timeout, tracing)
//! - Bind the server to a listener and serve with graceful shutdown
//!
//! # Design Decisions
//! - Route policies are enumerated here, once, at startup
//! - The guard middleware runs per route group; ordering inside the guard
//!   is fixed by the composer, not by layer registration

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::resolver::{PrincipalStore, Resolver, RevocationList};
use crate::config::GuardConfig;
use crate::http::handlers::{self, AppState};
use crate::pipeline::{self, GuardState, RoutePolicy};
use crate::ratelimit::{EndpointClass, MemoryCounterStore, RateLimiter};
use crate::sanitize::Sanitizer;
use crate::security::{headers, AuditLog, SignatureScanner};
use crate::auth::AuthMode;
use crate::validate::{Rule, RuleSet, Validator};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP server fronting the request-defense pipeline.
pub struct GuardServer {
    router: Router,
    config: GuardConfig,
}

impl GuardServer {
    /// Build the server. Must be called inside a Tokio runtime: the audit
    /// drain and the window sweeper are spawned here.
    pub fn new(
        config: GuardConfig,
        principals: Arc<dyn PrincipalStore>,
        revocations: Option<Arc<dyn RevocationList>>,
    ) -> Self {
        let store = Arc::new(MemoryCounterStore::new());
        let _sweeper = MemoryCounterStore::spawn_sweeper(store.clone(), SWEEP_INTERVAL);

        let limiter = Arc::new(RateLimiter::new(store, config.rate_limit.clone()));

        let mut resolver = Resolver::new(config.auth.signing_secret.clone(), principals.clone());
        if let Some(revocations) = revocations {
            resolver = resolver.with_revocations(revocations);
        }
        if resolver.trusts_signature_alone() {
            tracing::info!(
                "No revocation list configured; credentials are trusted on signature and expiry alone"
            );
        }

        let (audit, _drain) = AuditLog::spawn();

        let denied_origins: Vec<std::net::IpAddr> = config
            .security
            .denied_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        let guard_state = GuardState {
            sanitizer: Arc::new(Sanitizer::new()),
            validator: Arc::new(Validator::new()),
            scanner: Arc::new(SignatureScanner::new()),
            limiter,
            resolver: Arc::new(resolver),
            audit,
            max_body_bytes: config.security.max_body_bytes,
            denied_origins: Arc::new(denied_origins),
            signature_scan: config.security.signature_scan,
        };

        let app_state = AppState {
            auth: config.auth.clone(),
            principals,
        };

        let router = Self::build_router(&config, guard_state, app_state);
        Self { router, config }
    }

    /// Build the router: one guarded group per endpoint class.
    fn build_router(config: &GuardConfig, guard: GuardState, app_state: AppState) -> Router {
        let login_rules = RuleSet::new()
            .required("email", vec![Rule::Email])
            .required("password", vec![Rule::MinLength(8)]);
        let register_rules = RuleSet::new()
            .required("name", vec![Rule::MinLength(2), Rule::MaxLength(60)])
            .required("email", vec![Rule::Email])
            .required("password", vec![Rule::MinLength(8), Rule::Password]);
        let reset_rules = RuleSet::new().required("email", vec![Rule::Email]);
        let order_rules = RuleSet::new()
            .required("product_id", vec![Rule::ObjectId])
            .required("quantity", vec![Rule::IntRange(1, 100)])
            .optional("shipping", vec![Rule::OneOf(&["standard", "express"])])
            .optional("coupon", vec![Rule::matches(r"^[A-Z0-9]{4,12}$")])
            .optional("note", vec![Rule::MaxLength(500)]);
        let review_rules = RuleSet::new()
            .required("product_id", vec![Rule::ObjectId])
            .required("rating", vec![Rule::IntRange(1, 5)])
            .optional("comment", vec![Rule::MaxLength(1000)]);

        let app = Router::new()
            .merge(guarded(
                Router::new().route("/auth/login", post(handlers::login)),
                RoutePolicy::new("login", EndpointClass::Auth).rules(login_rules),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/auth/register", post(handlers::register)),
                RoutePolicy::new("register", EndpointClass::Auth).rules(register_rules),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/auth/password-reset", post(handlers::password_reset)),
                RoutePolicy::new("password_reset", EndpointClass::PasswordReset)
                    .rules(reset_rules),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/search", get(handlers::search)),
                RoutePolicy::new("search", EndpointClass::Search).auth(AuthMode::Optional),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/products", get(handlers::list_products)),
                RoutePolicy::new("products", EndpointClass::General).auth(AuthMode::Optional),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/orders", post(handlers::create_order)),
                RoutePolicy::new("orders", EndpointClass::OrderCreate)
                    .auth(AuthMode::Required)
                    .verified_only()
                    .rules(order_rules),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/reviews", post(handlers::create_review)),
                RoutePolicy::new("reviews", EndpointClass::Review)
                    .auth(AuthMode::Required)
                    .rules(review_rules),
                &guard,
            ))
            .merge(guarded(
                Router::new().route("/admin/overview", get(handlers::admin_overview)),
                RoutePolicy::new("admin", EndpointClass::General).admin_only(),
                &guard,
            ))
            .route("/health", get(handlers::health))
            .with_state(app_state);

        // Hardened headers sit outermost so even rejections carry them.
        headers::harden(app)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.listener.request_timeout_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until ctrl-c or the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Request guard listening");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = shutdown.recv() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

/// Attach the guard middleware and its policy to a route group.
fn guarded(router: Router<AppState>, policy: RoutePolicy, state: &GuardState) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            pipeline::guard,
        ))
        .route_layer(Extension(Arc::new(policy)))
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install ctrl-c handler");
    }
}
