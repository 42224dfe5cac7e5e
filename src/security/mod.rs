//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (hardened response headers, unconditional)
//!     → signatures.rs (attack-signature scan, non-blocking)
//!     → audit.rs (alerts + completion records, off the critical path)
//! ```
//!
//! # Design Decisions
//! - A signature match never blocks a request; admit/reject is decided by
//!   the enforcement components alone
//! - No trust in client input

pub mod audit;
pub mod headers;
pub mod signatures;

pub use audit::{AuditLog, RequestOutcome, SecurityAlert};
pub use signatures::SignatureScanner;
