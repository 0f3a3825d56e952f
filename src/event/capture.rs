//! Response capture for event invocations.
//!
//! A handler's response is written into a [`ResponseSink`] the same way it
//! would be written to a socket: status, then headers, then body chunks.
//! [`CapturedResponse`] buffers all of it for conversion into an
//! [`EventResponse`].

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use crate::event::types::EventResponse;
use crate::event::EventError;

/// Destination for a handler's response.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);
    fn headers_mut(&mut self) -> &mut HeaderMap;
    /// Called once, before the first body chunk. Headers are final after this.
    fn begin_body(&mut self);
    fn append_body(&mut self, chunk: &[u8]);
}

/// In-memory sink. Status defaults to 200 when the handler never sets one.
#[derive(Debug)]
pub struct CapturedResponse {
    status: StatusCode,
    headers: HeaderMap,
    // Snapshot taken when the body starts; later header edits are ignored.
    committed: Option<HeaderMap>,
    body: BytesMut,
}

impl Default for CapturedResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            committed: None,
            body: BytesMut::new(),
        }
    }
}

impl CapturedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers as the client would have seen them.
    pub fn headers(&self) -> &HeaderMap {
        self.committed.as_ref().unwrap_or(&self.headers)
    }

    pub fn body(&self) -> Bytes {
        self.body.clone().freeze()
    }

    /// Flatten into an event response.
    ///
    /// The last value wins for repeated headers. Non-UTF-8 header values are
    /// skipped. The body is base64-encoded when `base64_body` is set, and
    /// lossily decoded as UTF-8 otherwise.
    pub fn into_event_response(self, base64_body: bool) -> EventResponse {
        let headers = self.committed.unwrap_or(self.headers);

        let mut flat: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers.iter() {
            let Ok(value) = value.to_str() else {
                tracing::debug!(header = %name, "Skipping non-UTF-8 response header");
                continue;
            };
            flat.insert(name.as_str().to_string(), value.to_string());
        }

        let body = if base64_body {
            STANDARD.encode(&self.body)
        } else {
            String::from_utf8_lossy(&self.body).into_owned()
        };

        EventResponse {
            status_code: self.status.as_u16(),
            headers: flat,
            is_base64_encoded: base64_body,
            body,
        }
    }
}

impl ResponseSink for CapturedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn begin_body(&mut self) {
        if self.committed.is_none() {
            self.committed = Some(self.headers.clone());
        }
    }

    fn append_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}

/// Write a full response into `sink`, streaming the body chunk by chunk.
pub async fn write_response<S: ResponseSink>(
    response: Response<Body>,
    sink: &mut S,
) -> Result<(), EventError> {
    let (parts, body) = response.into_parts();

    sink.set_status(parts.status);
    {
        let headers = sink.headers_mut();
        for (name, value) in parts.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
    }
    sink.begin_body();

    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(EventError::ResponseBody)?;
        sink.append_body(&chunk);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_ok() {
        let captured = CapturedResponse::new();
        let event = captured.into_event_response(false);
        assert_eq!(event.status_code, 200);
        assert!(event.headers.is_empty());
        assert_eq!(event.body, "");
    }

    #[test]
    fn test_headers_frozen_at_body_start() {
        let mut captured = CapturedResponse::new();
        captured.headers_mut().insert("x", "y".parse().unwrap());
        captured.begin_body();
        captured.headers_mut().insert("late", "ignored".parse().unwrap());
        captured.append_body(b"hi");

        assert!(captured.headers().get("late").is_none());
        assert_eq!(captured.body(), Bytes::from_static(b"hi"));
        let event = captured.into_event_response(false);
        assert_eq!(event.headers.len(), 1);
        assert_eq!(event.body, "hi");
    }

    #[tokio::test]
    async fn test_write_response_last_header_value_wins() {
        let response = Response::builder()
            .status(404)
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body(Body::from("missing"))
            .unwrap();

        let mut captured = CapturedResponse::new();
        write_response(response, &mut captured).await.unwrap();
        let event = captured.into_event_response(false);

        assert_eq!(event.status_code, 404);
        assert_eq!(event.headers["set-cookie"], "b=2");
        assert_eq!(event.body, "missing");
    }

    #[tokio::test]
    async fn test_base64_body() {
        let response = Response::new(Body::from(vec![0u8, 159, 146, 150]));
        let mut captured = CapturedResponse::new();
        write_response(response, &mut captured).await.unwrap();

        let event = captured.into_event_response(true);
        assert!(event.is_base64_encoded);
        assert_eq!(event.body, "AJ+Slg==");
    }
}
