//! Rate budget enforcement over a real listener.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use api_guard::auth::token::issue;
use api_guard::auth::MemoryPrincipalStore;
use api_guard::config::RateBudget;

mod common;
use common::{client, spawn_guard, test_config};

#[tokio::test]
async fn eleventh_login_attempt_in_the_window_is_rejected() {
    let mut config = test_config();
    config.rate_limit.auth = RateBudget {
        window_secs: 15 * 60,
        max_requests: 10,
    };
    let (addr, _shutdown) = spawn_guard(config, Arc::new(MemoryPrincipalStore::new())).await;

    let payload = json!({"email": "ghost@shop.test", "password": "whatever1"});
    for attempt in 1..=10 {
        let res = client()
            .post(format!("http://{addr}/auth/login"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        // unknown principal, but the attempt is admitted past the limiter
        assert_eq!(res.status(), 401, "attempt {attempt} should not be limited");
        let remaining: u32 = res
            .headers()
            .get("x-ratelimit-remaining")
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(remaining, 10 - attempt);
    }

    let res = client()
        .post(format!("http://{addr}/auth/login"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert!(res.headers().contains_key("retry-after"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    let retry_after = body["retryAfter"].as_u64().unwrap();
    assert!(retry_after > 0 && retry_after <= 15 * 60);
}

#[tokio::test]
async fn concurrent_burst_admits_exactly_the_budget() {
    let mut config = test_config();
    config.rate_limit.search = RateBudget {
        window_secs: 60,
        max_requests: 5,
    };
    let (addr, _shutdown) = spawn_guard(config, Arc::new(MemoryPrincipalStore::new())).await;

    let client = client();
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let client = client.clone();
        let url = format!("http://{addr}/search?q=shoes");
        tasks.push(tokio::spawn(async move {
            client.get(&url).send().await.unwrap().status().as_u16()
        }));
    }

    let mut admitted = 0;
    let mut limited = 0;
    for task in tasks {
        match task.await.unwrap() {
            200 => admitted += 1,
            429 => limited += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(admitted, 5);
    assert_eq!(limited, 15);
}

#[tokio::test]
async fn forged_subjects_cannot_split_the_counting_key() {
    let mut config = test_config();
    config.rate_limit.search = RateBudget {
        window_secs: 60,
        max_requests: 3,
    };
    let (addr, _shutdown) = spawn_guard(config, Arc::new(MemoryPrincipalStore::new())).await;

    // Credentials signed under the wrong secret, each claiming a fresh
    // subject. All of them must count against the origin-alone key.
    let mut admitted = 0;
    for i in 0..10 {
        let forged = issue("attacker-chosen-secret", &format!("fake-{i}"), 60).unwrap();
        let res = client()
            .get(format!("http://{addr}/search?q=shoes"))
            .bearer_auth(&forged)
            .send()
            .await
            .unwrap();
        if res.status() == 200 {
            admitted += 1;
        } else {
            assert_eq!(res.status(), 429);
        }
    }
    assert_eq!(admitted, 3);
}

#[tokio::test]
async fn elapsed_window_readmits_regardless_of_prior_count() {
    let mut config = test_config();
    config.rate_limit.search = RateBudget {
        window_secs: 1,
        max_requests: 2,
    };
    let (addr, _shutdown) = spawn_guard(config, Arc::new(MemoryPrincipalStore::new())).await;

    let url = format!("http://{addr}/search?q=boots");
    assert_eq!(client().get(&url).send().await.unwrap().status(), 200);
    assert_eq!(client().get(&url).send().await.unwrap().status(), 200);
    assert_eq!(client().get(&url).send().await.unwrap().status(), 429);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(client().get(&url).send().await.unwrap().status(), 200);
}

#[tokio::test]
async fn exempt_paths_are_never_counted() {
    let mut config = test_config();
    config.rate_limit.general = RateBudget {
        window_secs: 60,
        max_requests: 1,
    };
    config.rate_limit.exempt_paths.push("/products".to_string());
    let (addr, _shutdown) = spawn_guard(config, Arc::new(MemoryPrincipalStore::new())).await;

    // the budget would allow a single request; the skip predicate means the
    // route is never counted and carries no budget headers
    for _ in 0..5 {
        let res = client()
            .get(format!("http://{addr}/products"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert!(!res.headers().contains_key("x-ratelimit-limit"));
    }
}

#[tokio::test]
async fn budget_headers_are_reported_on_admitted_requests() {
    let (addr, _shutdown) = spawn_guard(test_config(), Arc::new(MemoryPrincipalStore::new())).await;

    let res = client()
        .get(format!("http://{addr}/search?q=sandals"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let headers = res.headers();
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "30");
    assert!(headers.contains_key("x-ratelimit-remaining"));
    assert!(headers.contains_key("x-ratelimit-reset"));
}
