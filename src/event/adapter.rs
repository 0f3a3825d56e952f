//! Drive an HTTP handler with invocation events.

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{Method, Request, Response, Uri};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tower::{BoxError, Service, ServiceExt};

use crate::event::capture::{write_response, CapturedResponse};
use crate::event::types::{BodyEncoding, EventResponse, ProxyEvent, SyntheticRequest};
use crate::event::EventError;

/// Header stamped on every event response.
pub const SERVED_BY_HEADER: &str = "x-served-by";
pub const SERVED_BY: &str = "http_enc_proxy";

const X_REAL_IP: &str = "x-real-ip";

impl SyntheticRequest {
    /// Build the HTTP request a handler expects.
    ///
    /// The `host` header, when present, becomes the URI authority.
    /// `x-real-ip` becomes the peer address seen through `ConnectInfo`.
    pub fn into_http(self) -> Result<Request<Body>, EventError> {
        let method = if self.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(self.method.as_bytes())
                .map_err(|_| EventError::Method(self.method.clone()))?
        };

        let host = self
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header::HOST.as_str()))
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty());

        let mut path_and_query = self.path;
        if let Some(query) = &self.query {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }
        let uri: Uri = match host {
            Some(host) => format!("http://{}{}", host, path_and_query).parse()?,
            None => path_and_query.parse()?,
        };

        let body = match self.encoding {
            BodyEncoding::Raw => Body::from(self.body),
            BodyEncoding::Base64 => Body::from(STANDARD.decode(self.body.as_bytes())?),
        };

        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(body)?;

        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| EventError::Header { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| EventError::Header { name: name.clone() })?;

            if header_name == header::CONTENT_LENGTH && value.trim().parse::<u64>().is_err() {
                tracing::debug!(value = %value, "Ignoring unparseable content-length");
                continue;
            }
            headers.append(header_name, header_value);
        }

        let peer = headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::new(ip, 0)));
        }

        Ok(request)
    }
}

/// Run one event through `service` and capture the result.
pub async fn invoke<S>(
    event: ProxyEvent,
    service: S,
    base64_body: bool,
) -> Result<EventResponse, EventError>
where
    S: Service<Request<Body>, Response = Response<Body>>,
    S::Error: Into<BoxError>,
{
    let request = SyntheticRequest::from(event).into_http()?;
    tracing::debug!(method = %request.method(), uri = %request.uri(), "Invoking handler for event");

    let response = service
        .oneshot(request)
        .await
        .map_err(|e| EventError::Handler(e.into()))?;

    let mut captured = CapturedResponse::new();
    write_response(response, &mut captured).await?;

    tracing::debug!(
        status = captured.status().as_u16(),
        headers = ?captured.headers(),
        "Handler response captured"
    );

    // Stamped last so a backend's own x-served-by never replaces it.
    let mut result = captured.into_event_response(base64_body);
    result
        .headers
        .insert(SERVED_BY_HEADER.to_string(), SERVED_BY.to_string());
    Ok(result)
}

/// Reusable adapter around a cloneable handler such as an axum `Router`.
#[derive(Debug, Clone)]
pub struct EventAdapter<S> {
    service: S,
    base64_body: bool,
}

impl<S> EventAdapter<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone,
    S::Error: Into<BoxError>,
{
    pub fn new(service: S) -> Self {
        Self {
            service,
            base64_body: false,
        }
    }

    /// Return response bodies base64-encoded.
    pub fn base64_body(mut self, enabled: bool) -> Self {
        self.base64_body = enabled;
        self
    }

    pub async fn invoke(&self, event: ProxyEvent) -> Result<EventResponse, EventError> {
        invoke(event, self.service.clone(), self.base64_body).await
    }
}
