//! Per-endpoint-class rate limiting against a shared counting store.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::{RateBudget, RateLimitConfig};
use crate::ratelimit::store::CounterStore;

/// Named grouping of routes sharing one rate budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    Auth,
    PasswordReset,
    General,
    Search,
    OrderCreate,
    Review,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Auth => "auth",
            EndpointClass::PasswordReset => "password_reset",
            EndpointClass::General => "general",
            EndpointClass::Search => "search",
            EndpointClass::OrderCreate => "order_create",
            EndpointClass::Review => "review",
        }
    }

    /// Authentication-adjacent classes key by network origin alone so
    /// rotating identities inside a window gains nothing; everything else
    /// keys by (origin, principal) so shared infrastructure does not
    /// penalize unrelated users behind one address.
    fn keys_by_origin_alone(&self) -> bool {
        matches!(self, EndpointClass::Auth | EndpointClass::PasswordReset)
    }
}

/// Admit/reject decision plus the budget metadata reported on every
/// response, regardless of outcome.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    pub resets_in: Duration,
}

/// Keyed, time-windowed request counting.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Skip predicate: paths exempt from counting entirely.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.config.exempt_paths.iter().any(|p| p == path)
    }

    fn budget_for(&self, class: EndpointClass) -> RateBudget {
        match class {
            EndpointClass::Auth => self.config.auth,
            EndpointClass::PasswordReset => self.config.password_reset,
            EndpointClass::General => self.config.general,
            EndpointClass::Search => self.config.search,
            EndpointClass::OrderCreate => self.config.order_create,
            EndpointClass::Review => self.config.review,
        }
    }

    /// Derive the composite counting key for this request.
    pub fn derive_key(
        class: EndpointClass,
        origin: IpAddr,
        identity_fragment: Option<&str>,
    ) -> String {
        match identity_fragment {
            Some(id) if !class.keys_by_origin_alone() => {
                format!("{}:{}:{}", class.as_str(), origin, id)
            }
            _ => format!("{}:{}", class.as_str(), origin),
        }
    }

    /// Count this request and decide admit/reject against the class budget.
    pub async fn check(
        &self,
        class: EndpointClass,
        origin: IpAddr,
        identity_fragment: Option<&str>,
    ) -> Decision {
        let budget = self.budget_for(class);
        let window = Duration::from_secs(budget.window_secs);
        let key = Self::derive_key(class, origin, identity_fragment);

        let snapshot = self.store.increment_and_read(&key, window).await;

        Decision {
            admitted: snapshot.count <= budget.max_requests,
            limit: budget.max_requests,
            remaining: budget.max_requests.saturating_sub(snapshot.count),
            resets_in: snapshot.resets_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::store::MemoryCounterStore;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        let mut config = RateLimitConfig::default();
        config.auth = RateBudget {
            window_secs,
            max_requests: max,
        };
        RateLimiter::new(Arc::new(MemoryCounterStore::new()), config)
    }

    fn origin() -> IpAddr {
        "10.0.0.1".parse().unwrap()
    }

    #[tokio::test]
    async fn admits_up_to_budget_then_rejects() {
        let limiter = limiter(3, 60);
        for i in 1..=3 {
            let decision = limiter.check(EndpointClass::Auth, origin(), None).await;
            assert!(decision.admitted, "request {i} should be admitted");
            assert_eq!(decision.remaining, 3 - i);
        }
        let decision = limiter.check(EndpointClass::Auth, origin(), None).await;
        assert!(!decision.admitted);
        assert_eq!(decision.remaining, 0);
        assert!(decision.resets_in.as_secs() <= 60);
    }

    #[tokio::test]
    async fn elapsed_window_readmits() {
        let mut config = RateLimitConfig::default();
        config.search = RateBudget {
            window_secs: 1,
            max_requests: 1,
        };
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), config);

        assert!(limiter.check(EndpointClass::Search, origin(), None).await.admitted);
        assert!(!limiter.check(EndpointClass::Search, origin(), None).await.admitted);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(limiter.check(EndpointClass::Search, origin(), None).await.admitted);
    }

    #[tokio::test]
    async fn concurrent_burst_admits_exactly_the_budget() {
        let max = 10u32;
        let limiter = Arc::new(limiter(max, 60));
        let mut tasks = Vec::new();
        for _ in 0..30 {
            let limiter = limiter.clone();
            tasks.push(tokio::spawn(async move {
                limiter.check(EndpointClass::Auth, origin(), None).await.admitted
            }));
        }
        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, max);
    }

    #[test]
    fn auth_classes_ignore_identity_in_keys() {
        let ip = origin();
        assert_eq!(
            RateLimiter::derive_key(EndpointClass::Auth, ip, Some("user-1")),
            "auth:10.0.0.1"
        );
        assert_eq!(
            RateLimiter::derive_key(EndpointClass::General, ip, Some("user-1")),
            "general:10.0.0.1:user-1"
        );
        assert_eq!(
            RateLimiter::derive_key(EndpointClass::General, ip, None),
            "general:10.0.0.1"
        );
    }

    #[tokio::test]
    async fn distinct_principals_behind_one_address_do_not_collide() {
        let mut config = RateLimitConfig::default();
        config.general = RateBudget {
            window_secs: 60,
            max_requests: 1,
        };
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), config);

        assert!(
            limiter
                .check(EndpointClass::General, origin(), Some("alice"))
                .await
                .admitted
        );
        assert!(
            limiter
                .check(EndpointClass::General, origin(), Some("bob"))
                .await
                .admitted
        );
        assert!(
            !limiter
                .check(EndpointClass::General, origin(), Some("alice"))
                .await
                .admitted
        );
    }

    #[test]
    fn exempt_paths_skip_counting() {
        let limiter = limiter(1, 60);
        assert!(limiter.is_exempt("/health"));
        assert!(!limiter.is_exempt("/orders"));
    }
}
