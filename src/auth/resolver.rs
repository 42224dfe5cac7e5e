//! Principal resolution: Extract → Decode+Verify → Resolve → Gate → Attach.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::auth::principal::{LifecycleState, Principal, Role};
use crate::auth::token::{self, CredentialError};
use crate::http::response::Reject;

/// Persistence collaborator boundary.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_principal_by_id(&self, id: &str) -> Option<Principal>;
}

/// Optional revocation collaborator, consulted by credential id.
///
/// When absent the resolver trusts signature + expiry alone; that policy is
/// logged once at startup rather than applied silently.
#[async_trait]
pub trait RevocationList: Send + Sync {
    async fn is_revoked(&self, credential_id: &str) -> bool;
}

/// In-memory principal store for the demo binary and tests.
#[derive(Default)]
pub struct MemoryPrincipalStore {
    principals: DashMap<String, Principal>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) {
        self.principals.insert(principal.id.clone(), principal);
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_principal_by_id(&self, id: &str) -> Option<Principal> {
        self.principals.get(id).map(|entry| entry.clone())
    }
}

/// How a route treats identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Route never looks at the credential.
    Disabled,
    /// Resolution failures are swallowed; the request proceeds anonymous.
    Optional,
    /// Any resolution failure rejects the request.
    Required,
}

/// Resolved identity attached to the request for downstream consumption.
/// This attachment is the resolver's only externally observable side effect.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub credential_id: String,
}

/// Resolves bearer credentials to principals.
pub struct Resolver {
    signing_secret: String,
    store: Arc<dyn PrincipalStore>,
    revocations: Option<Arc<dyn RevocationList>>,
}

impl Resolver {
    pub fn new(signing_secret: String, store: Arc<dyn PrincipalStore>) -> Self {
        Self {
            signing_secret,
            store,
            revocations: None,
        }
    }

    pub fn with_revocations(mut self, revocations: Arc<dyn RevocationList>) -> Self {
        self.revocations = Some(revocations);
        self
    }

    /// Run Decode+Verify, Resolve, and the lifecycle gate for one request.
    ///
    /// Callers pass the raw `Authorization` header value (or `None`); header
    /// absence and a malformed header reject identically so the two are
    /// indistinguishable downstream.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<AuthContext, Reject> {
        let bearer = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(Reject::MalformedCredential)?;

        let claims = token::verify(&self.signing_secret, bearer).map_err(|e| match e {
            CredentialError::Expired => Reject::ExpiredCredential,
            CredentialError::Malformed => Reject::MalformedCredential,
        })?;

        if let Some(revocations) = &self.revocations {
            if revocations.is_revoked(&claims.jti).await {
                return Err(Reject::RevokedCredential);
            }
        }

        let principal = self
            .store
            .find_principal_by_id(&claims.sub)
            .await
            .ok_or(Reject::UnknownPrincipal)?;

        if principal.state != LifecycleState::Active {
            return Err(Reject::InactivePrincipal);
        }

        Ok(AuthContext {
            principal,
            credential_id: claims.jti,
        })
    }

    /// Subject of a signature-valid credential, for rate-limit keying.
    ///
    /// A local HMAC check only: no store lookup, no revocation lookup, no
    /// lifecycle gate. Forged, garbled, or expired credentials yield `None`,
    /// so a client cannot split its counting key by minting subjects.
    pub fn verified_subject(&self, authorization: Option<&str>) -> Option<String> {
        let bearer = authorization?.strip_prefix("Bearer ")?;
        token::verify(&self.signing_secret, bearer)
            .ok()
            .map(|claims| claims.sub)
    }

    /// Whether the absent-revocation-list policy is in effect.
    pub fn trusts_signature_alone(&self) -> bool {
        self.revocations.is_none()
    }
}

/// Post-resolution gates, layered on top of an active principal.
pub fn gate_role(context: &AuthContext, require_admin: bool) -> Result<(), Reject> {
    if require_admin && context.principal.role != Role::Admin {
        return Err(Reject::InsufficientRole);
    }
    Ok(())
}

pub fn gate_verified(context: &AuthContext, require_verified: bool) -> Result<(), Reject> {
    if require_verified && !context.principal.verified {
        return Err(Reject::Unverified);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{issue, issue_with_expiry};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "resolver-test-signing-secret";

    fn resolver_with(principals: Vec<Principal>) -> Resolver {
        let store = MemoryPrincipalStore::new();
        for p in principals {
            store.insert(p);
        }
        Resolver::new(SECRET.to_string(), Arc::new(store))
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn resolves_active_principal() {
        let resolver = resolver_with(vec![Principal::active("user-1")]);
        let token = issue(SECRET, "user-1", 60).unwrap();
        let context = resolver.resolve(Some(&bearer(&token))).await.unwrap();
        assert_eq!(context.principal.id, "user-1");
    }

    #[tokio::test]
    async fn missing_header_rejects_as_malformed() {
        let resolver = resolver_with(vec![]);
        assert!(matches!(
            resolver.resolve(None).await,
            Err(Reject::MalformedCredential)
        ));
        assert!(matches!(
            resolver.resolve(Some("Token abc")).await,
            Err(Reject::MalformedCredential)
        ));
    }

    #[tokio::test]
    async fn expired_credential_wins_over_resolvable_subject() {
        // The subject exists and would resolve; expiry must still be the
        // reported reason.
        let resolver = resolver_with(vec![Principal::active("user-1")]);
        let past = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            - 300;
        let token = issue_with_expiry(SECRET, "user-1", past).unwrap();
        assert!(matches!(
            resolver.resolve(Some(&bearer(&token))).await,
            Err(Reject::ExpiredCredential)
        ));
    }

    #[tokio::test]
    async fn unknown_subject_rejects() {
        let resolver = resolver_with(vec![]);
        let token = issue(SECRET, "ghost", 60).unwrap();
        assert!(matches!(
            resolver.resolve(Some(&bearer(&token))).await,
            Err(Reject::UnknownPrincipal)
        ));
    }

    #[tokio::test]
    async fn suspended_principal_rejects_after_successful_lookup() {
        let resolver = resolver_with(vec![
            Principal::active("user-1").with_state(LifecycleState::Suspended)
        ]);
        let token = issue(SECRET, "user-1", 60).unwrap();
        assert!(matches!(
            resolver.resolve(Some(&bearer(&token))).await,
            Err(Reject::InactivePrincipal)
        ));
    }

    #[tokio::test]
    async fn revoked_credential_rejects() {
        struct RevokeAll;
        #[async_trait]
        impl RevocationList for RevokeAll {
            async fn is_revoked(&self, _credential_id: &str) -> bool {
                true
            }
        }

        let resolver = resolver_with(vec![Principal::active("user-1")])
            .with_revocations(Arc::new(RevokeAll));
        let token = issue(SECRET, "user-1", 60).unwrap();
        assert!(matches!(
            resolver.resolve(Some(&bearer(&token))).await,
            Err(Reject::RevokedCredential)
        ));
    }

    #[test]
    fn verified_subject_requires_a_valid_signature() {
        let resolver = resolver_with(vec![]);

        // properly signed: subject is usable as a counting-key fragment,
        // even when no principal record exists yet
        let token = issue(SECRET, "user-9", 60).unwrap();
        assert_eq!(
            resolver.verified_subject(Some(&bearer(&token))).as_deref(),
            Some("user-9")
        );

        // signed under a different secret: the claimed subject is ignored
        let forged = issue("attacker-chosen-secret", "user-9", 60).unwrap();
        assert_eq!(resolver.verified_subject(Some(&bearer(&forged))), None);

        assert_eq!(resolver.verified_subject(Some("Bearer garbage")), None);
        assert_eq!(resolver.verified_subject(None), None);
    }

    #[test]
    fn role_and_verified_gates() {
        let admin = AuthContext {
            principal: Principal::active("a").with_role(Role::Admin),
            credential_id: "jti".into(),
        };
        let standard = AuthContext {
            principal: Principal::active("s").with_verified(false),
            credential_id: "jti".into(),
        };

        assert!(gate_role(&admin, true).is_ok());
        assert!(matches!(
            gate_role(&standard, true),
            Err(Reject::InsufficientRole)
        ));
        assert!(matches!(
            gate_verified(&standard, true),
            Err(Reject::Unverified)
        ));
        assert!(gate_verified(&standard, false).is_ok());
    }
}
