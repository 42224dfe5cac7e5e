//! HTTP surface: server wiring, handlers, and the rejection envelope.

pub mod handlers;
pub mod response;
pub mod server;

pub use response::Reject;
pub use server::GuardServer;
