//! Request-level and startup errors.

use axum::http::uri::InvalidUri;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ConfigError;
use crate::http::transport::TransportError;

/// Errors that end a proxied request with an error response.
///
/// Body encryption failures are not here: they are absorbed by forwarding
/// the original body.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No target matches the path. Never forwarded anywhere.
    #[error("No target matches path {path:?}")]
    RoutingMiss { path: String },

    /// Inbound body could not be read in full (client abort, over limit).
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// Rewritten upstream URI is not valid.
    #[error("Invalid upstream URI: {0}")]
    InvalidUri(#[from] InvalidUri),

    /// Backend unreachable or failed mid-exchange. Not retried.
    #[error(transparent)]
    Backend(#[from] TransportError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RoutingMiss { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidUri(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::RoutingMiss { .. } => "No target configured for this path",
            ProxyError::BodyRead(_) => "Failed to read request body",
            ProxyError::InvalidUri(_) => "Failed to build upstream request",
            ProxyError::Backend(_) => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

/// Errors that prevent the proxy from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// TLS root store could not be loaded for the HTTPS client.
    #[error("Failed to initialize HTTP client: {0}")]
    Transport(#[from] std::io::Error),
}
