//! Response post-processing.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from the backend response
//! - Drop `content-encoding` for targets that ask for it
//! - Log the completed exchange off the response path
//!
//! # Design Decisions
//! - Never fails: a response that arrived is always returned
//! - Body keeps streaming; nothing here buffers it

use axum::body::Body;
use axum::http::{header, Method, Response, StatusCode};

use crate::http::headers::strip_hop_by_hop;
use crate::routing::Target;

/// Apply per-target response rules in place.
pub fn modify_response(response: &mut Response<Body>, target: &Target) {
    let headers = response.headers_mut();
    strip_hop_by_hop(headers);

    // HeaderMap keys are case-insensitive, so this covers every casing.
    if target.drop_content_encoding() {
        headers.remove(header::CONTENT_ENCODING);
    }
}

/// Log the exchange from a detached task. Best effort: nothing awaits it.
pub fn log_response(method: Method, status: StatusCode, url: String) {
    tokio::spawn(async move {
        tracing::info!(
            method = %method,
            status = status.as_u16(),
            url = %url,
            "Proxied response"
        );
    });
}
