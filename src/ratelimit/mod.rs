//! Rate limiting subsystem.
//!
//! # Design Decisions
//! - Counts live in a shared keyed store with atomic increment-and-read and
//!   store-native expiry; the limiter never performs explicit cleanup
//! - Key derivation is pluggable per endpoint class
//! - The budget metadata (limit, remaining, reset) is reported on every
//!   response, admitted or not
//! - An increment is never rolled back: a request abandoned mid-pipeline
//!   still consumes budget

pub mod limiter;
pub mod store;

pub use limiter::{Decision, EndpointClass, RateLimiter};
pub use store::{CounterStore, MemoryCounterStore, WindowSnapshot};
