//! Security event and request-outcome auditing.
//!
//! Producers push records onto an unbounded channel; a background task
//! drains it and emits structured events. Nothing here runs on the
//! request's critical path beyond the channel send.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::observability::metrics;

/// Write-once record of a matched attack signature.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAlert {
    pub signature: String,
    /// Principal id when resolved, otherwise the network origin.
    pub identity: String,
    pub path: String,
    /// Bounded excerpt of the offending content.
    pub excerpt: String,
    pub timestamp: u64,
}

const EXCERPT_LIMIT: usize = 200;

impl SecurityAlert {
    pub fn new(signature: &str, identity: &str, path: &str, content: &str) -> Self {
        let excerpt = content.chars().take(EXCERPT_LIMIT).collect();
        Self {
            signature: signature.to_string(),
            identity: identity.to_string(),
            path: path.to_string(),
            excerpt,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

/// One fully completed request, recorded after the response was produced.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub identity: String,
    pub elapsed_ms: u128,
    pub flagged: bool,
}

#[derive(Debug)]
pub enum AuditEvent {
    Alert(SecurityAlert),
    Outcome(RequestOutcome),
}

/// Cheap, cloneable handle for pushing audit events.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl AuditLog {
    /// Spawn the drain task and return the producer handle.
    pub fn spawn() -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drain(rx));
        (Self { tx }, handle)
    }

    /// Non-blocking; a closed channel during shutdown drops the event.
    pub fn record(&self, event: AuditEvent) {
        let _ = self.tx.send(event);
    }

    pub fn alert(&self, alert: SecurityAlert) {
        metrics::record_security_alert(&alert.signature);
        self.record(AuditEvent::Alert(alert));
    }

    pub fn outcome(&self, outcome: RequestOutcome) {
        self.record(AuditEvent::Outcome(outcome));
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<AuditEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            AuditEvent::Alert(alert) => {
                tracing::warn!(
                    signature = %alert.signature,
                    identity = %alert.identity,
                    path = %alert.path,
                    excerpt = %alert.excerpt,
                    timestamp = alert.timestamp,
                    "Attack signature matched"
                );
            }
            AuditEvent::Outcome(outcome) => {
                tracing::info!(
                    request_id = %outcome.request_id,
                    method = %outcome.method,
                    path = %outcome.path,
                    status = outcome.status,
                    identity = %outcome.identity,
                    elapsed_ms = outcome.elapsed_ms,
                    flagged = outcome.flagged,
                    "Request audited"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_excerpt_is_bounded() {
        let long = "x".repeat(5000);
        let alert = SecurityAlert::new("script-injection", "10.0.0.1", "/search", &long);
        assert_eq!(alert.excerpt.len(), EXCERPT_LIMIT);
    }

    #[tokio::test]
    async fn recording_never_blocks_the_caller() {
        let (log, handle) = AuditLog::spawn();
        for _ in 0..1000 {
            log.alert(SecurityAlert::new("path-traversal", "t", "/p", "../x"));
        }
        drop(log);
        // drain task exits once all senders are gone
        handle.await.unwrap();
    }
}
