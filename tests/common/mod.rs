//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_enc_proxy::config::{ProxyConfig, TargetConfig};
use http_enc_proxy::encryption::{EncryptionEngine, EngineError, Envelope};
use http_enc_proxy::{HttpServer, Shutdown};
use serde_json::json;
use tokio::net::TcpListener;

/// Appends `E` to every value; makes encrypted output predictable.
pub struct SuffixEngine;

impl EncryptionEngine for SuffixEngine {
    fn execute(&self, envelope: &mut Envelope) -> Result<(), EngineError> {
        envelope.encrypt_selected(|v| Ok(format!("{}E", v)))
    }
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let payload = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "host": header("host"),
        "forwarded_for": header("x-forwarded-for"),
        "content_type": header("content-type"),
        "body": String::from_utf8_lossy(&body),
    });

    (
        [
            ("content-encoding", "identity"),
            ("x-backend", "echo"),
            ("x-served-by", "cache-echo-1"),
        ],
        axum::Json(payload),
    )
        .into_response()
}

/// Start an echo backend on an ephemeral port.
///
/// Every response carries `content-encoding: identity` so that dropping it
/// is observable, an `x-served-by` of its own like a CDN edge would send, and
/// a JSON body describing the request it received.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A CDN-style target and an encrypting catch-all, both on `backend`.
pub fn two_target_config(backend: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.targets = vec![
        TargetConfig {
            name: Some("cdn".into()),
            path_prefixes: vec!["/v1/projects".into(), "/analytics.js/v1".into()],
            destination: format!("http://{}/cdn", backend),
            drop_content_encoding: true,
            ..Default::default()
        },
        TargetConfig {
            name: Some("api".into()),
            destination: format!("http://{}/api?src=proxy", backend),
            encrypt_json: true,
            ..Default::default()
        },
    ];
    config
}

/// Start a proxy on an ephemeral port. Dropping the returned `Shutdown`
/// does not stop it; call `trigger`.
pub async fn start_proxy(
    config: ProxyConfig,
    engine: Arc<dyn EncryptionEngine>,
) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config, engine).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Build a request for driving a router directly.
pub fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}
