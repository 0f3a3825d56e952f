//! HTTP server setup and the proxy pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (tracing)
//! - Bind server to listener, shut down gracefully
//! - Drive each request: resolve → rewrite → forward → modify → return
//!
//! # Request States
//! ```text
//! Received → Resolved → Rewritten → Forwarded → ResponseModified → Returned
//!              │
//!              └─ no target → 500, never forwarded
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::encryption::EncryptionEngine;
use crate::error::{ProxyError, StartupError};
use crate::http::request::{rewrite_body, rewrite_parts, strip_route_prefix};
use crate::http::response::{log_response, modify_response};
use crate::http::transport::{HyperTransport, Transport};
use crate::observability::metrics;
use crate::routing::TargetRegistry;

/// Application state injected into handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TargetRegistry>,
    pub engine: Arc<dyn EncryptionEngine>,
    pub transport: Arc<dyn Transport>,
    pub route_prefix: Arc<str>,
    pub max_body_bytes: usize,
}

/// HTTP server for the encryption proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server forwarding over the pooled HTTPS-or-HTTP client.
    pub fn new(
        config: ProxyConfig,
        engine: Arc<dyn EncryptionEngine>,
    ) -> Result<Self, StartupError> {
        let transport = Arc::new(HyperTransport::new()?);
        Self::with_transport(config, engine, transport)
    }

    /// Create a server with an explicit transport.
    pub fn with_transport(
        config: ProxyConfig,
        engine: Arc<dyn EncryptionEngine>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StartupError> {
        let registry = TargetRegistry::from_config(&config.targets)
            .map_err(crate::config::ConfigError::from)?;

        for target in registry.targets() {
            tracing::debug!(
                target_name = %target.name(),
                destination = %target.destination(),
                prefixes = ?target.matcher().prefixes(),
                encrypt_json = target.encrypt_json(),
                drop_content_encoding = target.drop_content_encoding(),
                "Target registered"
            );
        }

        let state = AppState {
            registry: Arc::new(registry),
            engine,
            transport,
            route_prefix: Arc::from(config.route_prefix.as_str()),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The request handler as a `tower::Service`, for non-listening hosts.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route_prefix = %self.config.route_prefix,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    match forward(&state, request, start_time).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                ProxyError::RoutingMiss { path } => {
                    tracing::error!(method = %method, path = %path, "No target matched, refusing to forward")
                }
                other => tracing::error!(method = %method, error = %other, "Proxy request failed"),
            }
            metrics::record_request(&method, e.status().as_u16(), "none", start_time);
            e.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    start_time: Instant,
) -> Result<Response, ProxyError> {
    // Absent when running behind the event adapter without x-real-ip.
    let peer: Option<IpAddr> = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (mut parts, body) = request.into_parts();
    let path = strip_route_prefix(parts.uri.path(), &state.route_prefix).to_string();
    let method = parts.method.clone();

    tracing::info!(method = %method, path = %path, "Inbound request");

    // 1. Resolve
    let target = state
        .registry
        .resolve(&path)
        .ok_or_else(|| ProxyError::RoutingMiss { path: path.clone() })?;

    // 2. Rewrite
    rewrite_parts(&mut parts, target, &path, peer)?;
    let body = rewrite_body(
        &mut parts,
        body,
        target,
        state.engine.as_ref(),
        state.max_body_bytes,
    )
    .await?;

    let url = parts.uri.to_string();
    tracing::info!(method = %method, url = %url, target_name = %target.name(), "Forwarding request");

    // 3. Forward
    let mut response = state
        .transport
        .forward(Request::from_parts(parts, body))
        .await?;

    // 4. Modify
    modify_response(&mut response, target);
    let status = response.status();
    log_response(method.clone(), status, url);
    metrics::record_request(method.as_str(), status.as_u16(), target.name(), start_time);

    Ok(response)
}
