//! End-to-end proxy tests against a local echo backend.

use std::sync::Arc;

use axum::http::StatusCode;
use http_enc_proxy::config::TargetConfig;
use http_enc_proxy::encryption::{DisabledEngine, XChaChaEngine};
use serde_json::{json, Value};

mod common;
use common::SuffixEngine;

async fn echoed(res: reqwest::Response) -> Value {
    res.json().await.unwrap()
}

#[tokio::test]
async fn test_cdn_target_rewrites_path_and_drops_encoding() {
    let backend = common::start_echo_backend().await;
    let (proxy, shutdown) =
        common::start_proxy(common::two_target_config(backend), Arc::new(SuffixEngine)).await;

    let res = common::client()
        .get(format!("http://{}/v1/projects/abc/settings?x=1", proxy))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("content-encoding").is_none());
    assert_eq!(res.headers()["x-backend"], "echo");
    // Only event responses are stamped; plain HTTP passes the backend's value.
    assert_eq!(res.headers()["x-served-by"], "cache-echo-1");

    let seen = echoed(res).await;
    assert_eq!(seen["method"], "GET");
    assert_eq!(seen["path"], "/cdn/v1/projects/abc/settings");
    assert_eq!(seen["query"], "x=1");
    assert_eq!(seen["host"], backend.to_string());
    assert_eq!(seen["forwarded_for"], "127.0.0.1");

    shutdown.trigger();
}

#[tokio::test]
async fn test_api_target_encrypts_properties() {
    let backend = common::start_echo_backend().await;
    let (proxy, shutdown) =
        common::start_proxy(common::two_target_config(backend), Arc::new(SuffixEngine)).await;

    let res = common::client()
        .post(format!("http://{}/v1/track", proxy))
        .json(&json!({"event": "x", "properties": {"a": 1, "b": "two", "c": null}}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    // Only the CDN target drops it.
    assert_eq!(res.headers()["content-encoding"], "identity");

    let seen = echoed(res).await;
    assert_eq!(seen["method"], "POST");
    assert_eq!(seen["path"], "/api/v1/track");
    assert_eq!(seen["query"], "src=proxy");
    assert_eq!(
        seen["body"],
        r#"{"event":"x","properties":{"a":"1E","b":"twoE","c":"E"}}"#
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_json_body_passes_through() {
    let backend = common::start_echo_backend().await;
    let (proxy, shutdown) =
        common::start_proxy(common::two_target_config(backend), Arc::new(SuffixEngine)).await;

    let body = r#"{"properties":{"a":"1"}}"#;
    let res = common::client()
        .post(format!("http://{}/v1/batch?y=2", proxy))
        .header("content-type", "text/plain")
        .body(body)
        .send()
        .await
        .unwrap();

    let seen = echoed(res).await;
    assert_eq!(seen["query"], "src=proxy&y=2");
    assert_eq!(seen["body"], body);

    shutdown.trigger();
}

#[tokio::test]
async fn test_engine_failure_forwards_original_body() {
    let backend = common::start_echo_backend().await;
    let (proxy, shutdown) =
        common::start_proxy(common::two_target_config(backend), Arc::new(DisabledEngine)).await;

    let body = r#"{"properties":{"a":"1"}}"#;
    let res = common::client()
        .post(format!("http://{}/v1/track", proxy))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(echoed(res).await["body"], body);

    shutdown.trigger();
}

#[tokio::test]
async fn test_xchacha_engine_ciphertext_opens() {
    let backend = common::start_echo_backend().await;
    let engine = Arc::new(XChaChaEngine::new(&[7u8; 32]));
    let (proxy, shutdown) =
        common::start_proxy(common::two_target_config(backend), engine.clone()).await;

    let res = common::client()
        .post(format!("http://{}/v1/track", proxy))
        .json(&json!({"properties": {"plan": "pro", "seats": 3}}))
        .send()
        .await
        .unwrap();

    let seen = echoed(res).await;
    let forwarded: Value = serde_json::from_str(seen["body"].as_str().unwrap()).unwrap();
    let plan = forwarded["properties"]["plan"].as_str().unwrap();
    let seats = forwarded["properties"]["seats"].as_str().unwrap();

    assert_ne!(plan, "pro");
    assert_eq!(engine.open(plan).unwrap(), "pro");
    assert_eq!(engine.open(seats).unwrap(), "3");

    shutdown.trigger();
}

#[tokio::test]
async fn test_route_prefix_is_stripped() {
    let backend = common::start_echo_backend().await;
    let mut config = common::two_target_config(backend);
    config.route_prefix = "/proxy".into();
    let (proxy, shutdown) = common::start_proxy(config, Arc::new(SuffixEngine)).await;

    let res = common::client()
        .get(format!("http://{}/proxy/analytics.js/v1/key/analytics.min.js", proxy))
        .send()
        .await
        .unwrap();

    assert!(res.headers().get("content-encoding").is_none());
    assert_eq!(
        echoed(res).await["path"],
        "/cdn/analytics.js/v1/key/analytics.min.js"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_routing_miss_is_500() {
    let backend = common::start_echo_backend().await;
    let mut config = common::two_target_config(backend);
    config.targets.truncate(1);
    let (proxy, shutdown) = common::start_proxy(config, Arc::new(SuffixEngine)).await;

    let res = common::client()
        .get(format!("http://{}/v1/track", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    // Reserve a port, then free it so nothing is listening there.
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut config = common::two_target_config(closed);
    config.targets = vec![TargetConfig {
        destination: format!("http://{}", closed),
        ..Default::default()
    }];
    let (proxy, shutdown) = common::start_proxy(config, Arc::new(SuffixEngine)).await;

    let res = common::client()
        .get(format!("http://{}/anything", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}
