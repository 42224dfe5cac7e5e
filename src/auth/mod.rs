//! Principal resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → token.rs (signature + expiry verification)
//!     → resolver.rs (principal lookup, lifecycle gate)
//!     → AuthContext attached to request extensions
//! ```
//!
//! # Design Decisions
//! - Expired and malformed credentials are distinguished for the caller,
//!   but both behave as "absent" downstream
//! - Unexpected verification faults collapse to a 401, never a 500
//! - Principal records are read-only, request-scoped snapshots

pub mod principal;
pub mod resolver;
pub mod token;

pub use principal::{LifecycleState, Principal, Role};
pub use resolver::{
    AuthContext, AuthMode, MemoryPrincipalStore, PrincipalStore, Resolver, RevocationList,
};
