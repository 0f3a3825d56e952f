//! Event-invocation adapter.
//!
//! Lets the proxy run where requests arrive as JSON events instead of on a
//! socket. Each event becomes an HTTP request, is driven through the same
//! handler the server uses, and the captured response becomes a JSON result.
//!
//! # Data Flow
//! ```text
//! ProxyEvent → SyntheticRequest → Request<Body> → handler
//!                                                   │
//! EventResponse ← CapturedResponse ← Response<Body> ┘
//! ```

pub mod adapter;
pub mod capture;
pub mod types;

use axum::http::uri::InvalidUri;
use thiserror::Error;
use tower::BoxError;

pub use adapter::{invoke, EventAdapter, SERVED_BY, SERVED_BY_HEADER};
pub use capture::{write_response, CapturedResponse, ResponseSink};
pub use types::{BodyEncoding, EventResponse, ProxyEvent, SyntheticRequest};

/// Errors turning an event into a request, or a response into a result.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid base64 body: {0}")]
    Body(#[from] base64::DecodeError),

    #[error("Invalid HTTP method: {0:?}")]
    Method(String),

    #[error("Invalid header: {name:?}")]
    Header { name: String },

    #[error("Invalid request URI: {0}")]
    Uri(#[from] InvalidUri),

    #[error("Failed to build request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("Handler failed: {0}")]
    Handler(BoxError),

    #[error("Failed to read response body: {0}")]
    ResponseBody(axum::Error),
}
