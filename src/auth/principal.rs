//! Principal records, as seen through the persistence boundary.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a principal account.
///
/// Anything other than `Active` must never reach business logic unless the
/// route explicitly permits anonymous access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Pending,
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Admin,
}

/// Read-only, request-scoped copy of a principal record.
///
/// Owned by the persistence collaborator; the resolver only ever holds a
/// snapshot keyed by the decoded credential's subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,

    /// Never exposed in responses or logs.
    #[serde(skip_serializing)]
    pub credential_hash: String,

    pub state: LifecycleState,
    pub role: Role,
    pub verified: bool,
}

impl Principal {
    /// Convenience constructor for stores and tests.
    pub fn active(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential_hash: String::new(),
            state: LifecycleState::Active,
            role: Role::Standard,
            verified: true,
        }
    }

    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }
}
