//! Request rewriting.
//!
//! # Responsibilities
//! - Strip the configured route prefix before resolution
//! - Point the request at the resolved destination (URI and Host header)
//! - Buffer and encrypt JSON bodies for encrypting targets
//!
//! # Design Decisions
//! - Head rewrite is a pure function over `Parts`; the body step is the only
//!   async part because it may buffer
//! - Bodies are only buffered when a transform is required; everything else
//!   streams straight through
//! - A failed transform forwards the original bytes

use std::net::IpAddr;

use axum::body::Body;
use axum::http::header::{self, HeaderValue};
use axum::http::request::Parts;
use axum::http::Version;

use crate::encryption::{transform, EncryptionEngine};
use crate::error::ProxyError;
use crate::http::headers::{append_forwarded_for, strip_hop_by_hop};
use crate::observability::metrics;
use crate::routing::Target;

/// Remove a leading route prefix. Paths without it are returned unchanged.
///
/// Matching is by string, not by path segment: `/proxyfoo` under `/proxy`
/// becomes `foo`, which only a catch-all target resolves.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    path.strip_prefix(prefix).unwrap_or(path)
}

/// Rewrite the request head for `target`.
///
/// `path` is the request path after route prefix stripping.
pub fn rewrite_parts(
    parts: &mut Parts,
    target: &Target,
    path: &str,
    peer: Option<IpAddr>,
) -> Result<(), ProxyError> {
    let destination = target.destination();
    parts.uri = destination.upstream_uri(path, parts.uri.query())?;

    strip_hop_by_hop(&mut parts.headers);

    // Many clients keep the inbound Host; virtual-hosted backends need theirs.
    if let Ok(host) = HeaderValue::from_str(destination.authority()) {
        parts.headers.insert(header::HOST, host);
    }
    if let Some(ip) = peer {
        append_forwarded_for(&mut parts.headers, ip);
    }

    // Let the client negotiate the upstream protocol.
    parts.version = Version::HTTP_11;
    Ok(())
}

/// Produce the body to forward, encrypting it when the target asks for it.
pub async fn rewrite_body(
    parts: &mut Parts,
    body: Body,
    target: &Target,
    engine: &dyn EncryptionEngine,
    max_body_bytes: usize,
) -> Result<Body, ProxyError> {
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if !transform::applies_to(content_type.as_deref(), target) {
        return Ok(body);
    }

    let original = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    let outcome = transform::apply(original.clone(), content_type.as_deref(), target, engine);
    match &outcome.error {
        Some(error) => {
            tracing::warn!(
                method = %parts.method,
                target_name = %target.name(),
                error = %error,
                "Body encryption skipped, forwarding original body"
            );
            metrics::record_encryption(target.name(), "failed");
        }
        None if outcome.is_rewritten(&original) => {
            tracing::debug!(
                method = %parts.method,
                target_name = %target.name(),
                original_bytes = original.len(),
                encrypted_bytes = outcome.body.len(),
                "Encrypted request body"
            );
            metrics::record_encryption(target.name(), "encrypted");
        }
        None => metrics::record_encryption(target.name(), "unchanged"),
    }

    parts.headers.remove(header::TRANSFER_ENCODING);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(outcome.body.len()));

    Ok(Body::from(outcome.body))
}
