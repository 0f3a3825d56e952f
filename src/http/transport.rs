//! Forward-and-stream transport.
//!
//! # Responsibilities
//! - Send a fully rewritten request to its absolute upstream URI
//! - Hand back the response with its body still streaming
//!
//! # Design Decisions
//! - Trait object at the seam so the pipeline can run against a stub
//! - No timeouts or retries here; the surrounding server owns those policies
//! - HTTP and HTTPS backends share one pooled client

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

/// Backend could not be reached or the exchange broke mid-flight.
#[derive(Debug, Error)]
#[error("Upstream request failed: {0}")]
pub struct TransportError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Future returned by [`Transport::forward`].
pub type TransportFuture = BoxFuture<'static, Result<Response<Body>, TransportError>>;

/// Sends requests to backends.
pub trait Transport: Send + Sync + 'static {
    fn forward(&self, request: Request<Body>) -> TransportFuture;
}

/// hyper-util pooled client over a rustls HTTPS-or-HTTP connector.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl HyperTransport {
    /// Build the client, loading the platform's trusted roots.
    pub fn new() -> Result<Self, std::io::Error> {
        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Ok(Self { client })
    }
}

impl Transport for HyperTransport {
    fn forward(&self, request: Request<Body>) -> TransportFuture {
        let pending = self.client.request(request);
        Box::pin(async move {
            let response = pending.await.map_err(TransportError::new)?;
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}
