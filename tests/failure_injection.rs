//! Failure injection tests for the retry and circuit breaker layers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

mod common;

use common::*;

fn lecture_routes(retries: u32) -> String {
    format!(
        r#"
[[routes]]
id = "live-lecture-service"
paths = ["/live-lecture/**"]
service = "live-lecture-service"
filters = ["logging"]
resilience = {{ breaker = "live-lecture-service", fallback = "/fallback/live-lecture", retries = {retries} }}
"#
    )
}

async fn breaker_state(gateway: &TestGateway, name: &str) -> String {
    let breakers: Vec<Value> = client()
        .get(gateway.url("/actuator/circuitbreakers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    breakers
        .iter()
        .find(|b| b["name"] == name)
        .map(|b| b["state"].as_str().unwrap().to_string())
        .unwrap()
}

#[tokio::test]
async fn test_retry_recovers_from_transient_errors() {
    let backend = start_programmable_backend(|n| async move {
        if n < 2 {
            (503, "Service Unavailable".to_string())
        } else {
            (200, "Success".to_string())
        }
    })
    .await;
    let gateway = start_gateway(gateway_config(
        &[("live-lecture-service", backend.addr)],
        &lecture_routes(3),
    ))
    .await;

    let res = client().get(gateway.url("/live-lecture/sort/new")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Success");
    assert_eq!(backend.hits(), 3);
    assert_eq!(breaker_state(&gateway, "live-lecture-service").await, "CLOSED");
}

#[tokio::test]
async fn test_exhausted_retries_pass_last_response_through() {
    let backend = start_programmable_backend(|_| async { (500, "boom".to_string()) }).await;
    let gateway = start_gateway(gateway_config(
        &[("live-lecture-service", backend.addr)],
        &lecture_routes(2),
    ))
    .await;

    let res = client().get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "boom");
    assert_eq!(backend.hits(), 3);
}

#[tokio::test]
async fn test_non_idempotent_methods_are_not_retried() {
    let backend = start_programmable_backend(|_| async { (503, "busy".to_string()) }).await;
    let gateway = start_gateway(gateway_config(
        &[("live-lecture-service", backend.addr)],
        &lecture_routes(3),
    ))
    .await;
    let client = client();

    let res = client.post(gateway.url("/live-lecture/1")).body("{}").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "busy");
    assert_eq!(backend.hits(), 1);

    let res = client.put(gateway.url("/live-lecture/1")).body("{}").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(backend.hits(), 5);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = start_programmable_backend(|_| async { (404, "missing".to_string()) }).await;
    let gateway = start_gateway(gateway_config(
        &[("live-lecture-service", backend.addr)],
        &lecture_routes(3),
    ))
    .await;

    let res = client().get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_unreachable_backend_maps_to_bad_gateway() {
    let down = unused_addr().await;
    let gateway = start_gateway(gateway_config(&[("live-lecture-service", down)], &lecture_routes(1))).await;

    let res = client().get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 502);
    assert_eq!(body["path"], "/live-lecture/1");
}

#[tokio::test]
async fn test_slow_backend_maps_to_gateway_timeout() {
    let backend = start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        (200, "late".to_string())
    })
    .await;
    let mut config = gateway_config(&[("live-lecture-service", backend.addr)], &lecture_routes(0));
    config.timeouts.response_ms = 200;
    let gateway = start_gateway(config).await;

    let res = client().get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_breaker_opens_and_serves_fallback() {
    let backend = start_programmable_backend(|_| async { (500, "boom".to_string()) }).await;
    let gateway = start_gateway(gateway_config(
        &[("live-lecture-service", backend.addr)],
        &lecture_routes(3),
    ))
    .await;
    let client = client();

    // Four failed attempts stay under the minimum call count.
    let res = client.get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(backend.hits(), 4);

    // The fifth failure opens the circuit; the retry is denied.
    let res = client.get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.headers()["x-gateway-fallback"], "/fallback/live-lecture");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "FALLBACK");
    assert_eq!(body["service"], "live-lecture-service");
    assert_eq!(backend.hits(), 5);

    let res = client.get(gateway.url("/live-lecture/2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(backend.hits(), 5);

    assert_eq!(breaker_state(&gateway, "live-lecture-service").await, "OPEN");
}

#[tokio::test]
async fn test_breaker_recovers_through_half_open() {
    let healthy = Arc::new(AtomicBool::new(false));
    let flag = healthy.clone();
    let backend = start_programmable_backend(move |_| {
        let flag = flag.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                (200, "ok".to_string())
            } else {
                (500, "boom".to_string())
            }
        }
    })
    .await;

    let mut config = gateway_config(&[("live-lecture-service", backend.addr)], &lecture_routes(0));
    config.circuit_breaker.wait_duration_ms = 300;
    let gateway = start_gateway(config).await;
    let client = client();

    for _ in 0..5 {
        let res = client.get(gateway.url("/live-lecture/1")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
    let res = client.get(gateway.url("/live-lecture/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(backend.hits(), 5);

    healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(400)).await;

    for _ in 0..3 {
        let res = client.get(gateway.url("/live-lecture/1")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(backend.hits(), 8);
    assert_eq!(breaker_state(&gateway, "live-lecture-service").await, "CLOSED");
}

#[tokio::test]
async fn test_fallback_endpoint_served_directly() {
    let backend = start_mock_backend("live-lecture-service").await;
    let gateway = start_gateway(gateway_config(
        &[("live-lecture-service", backend.addr)],
        &lecture_routes(0),
    ))
    .await;

    let res = client().get(gateway.url("/fallback/live-lecture")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "FALLBACK");
    assert_eq!(backend.hits(), 0);
}
