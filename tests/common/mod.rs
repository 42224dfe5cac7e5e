//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_guard::auth::MemoryPrincipalStore;
use api_guard::config::GuardConfig;
use api_guard::http::GuardServer;
use api_guard::lifecycle::Shutdown;

pub const SECRET: &str = "integration-test-signing-secret";

/// Baseline config for tests: known secret, scanning on, generous budgets.
pub fn test_config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.auth.signing_secret = SECRET.to_string();
    config
}

/// Start a guard server on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_guard(
    config: GuardConfig,
    principals: Arc<MemoryPrincipalStore>,
) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = GuardServer::new(config, principals, None);

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Wait for the listener to start accepting
    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("reqwest client")
}
