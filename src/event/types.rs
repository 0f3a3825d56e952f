//! Invocation event and response shapes.
//!
//! Field names follow the API-Gateway proxy integration format, which is what
//! event-invoked runtimes hand to HTTP-style functions.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Path parameter carrying the remainder of a catch-all route (`/{proxy+}`).
pub const PROXY_PATH_PARAM: &str = "proxy";

/// One request-shaped invocation event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyEvent {
    #[serde(alias = "method")]
    pub http_method: String,
    pub path: Option<String>,
    pub path_parameters: Option<HashMap<String, String>>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

/// How a body string is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyEncoding {
    #[default]
    Raw,
    Base64,
}

/// Flattened request built from an event, before it becomes an HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticRequest {
    pub method: String,
    /// Effective path, always starting with `/`.
    pub path: String,
    /// Already form-encoded, without the leading `?`.
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub encoding: BodyEncoding,
}

impl From<ProxyEvent> for SyntheticRequest {
    fn from(event: ProxyEvent) -> Self {
        // Catch-all routes deliver the real path as a parameter.
        let raw_path = event
            .path_parameters
            .as_ref()
            .and_then(|params| params.get(PROXY_PATH_PARAM))
            .filter(|p| !p.is_empty())
            .cloned()
            .or(event.path)
            .unwrap_or_default();
        let path = if raw_path.starts_with('/') {
            raw_path
        } else {
            format!("/{}", raw_path)
        };

        let query = event
            .query_string_parameters
            .filter(|params| !params.is_empty())
            .map(|params| {
                let sorted: BTreeMap<_, _> = params.into_iter().collect();
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(sorted)
                    .finish()
            });

        let body = event.body.unwrap_or_default();
        let encoding = if event.is_base64_encoded && !body.is_empty() {
            BodyEncoding::Base64
        } else {
            BodyEncoding::Raw
        };

        Self {
            method: event.http_method,
            path,
            query,
            headers: event.headers.unwrap_or_default(),
            body,
            encoding,
        }
    }
}

/// One response-shaped invocation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub is_base64_encoded: bool,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_gateway_event() {
        let event: ProxyEvent = serde_json::from_str(
            r#"{
                "httpMethod": "POST",
                "path": "/proxy/v1/track",
                "pathParameters": {"proxy": "v1/track"},
                "queryStringParameters": null,
                "headers": {"Host": "abc.execute-api.example.com"},
                "body": "eyJhIjoxfQ==",
                "isBase64Encoded": true
            }"#,
        )
        .unwrap();

        assert_eq!(event.http_method, "POST");
        assert!(event.query_string_parameters.is_none());

        let request = SyntheticRequest::from(event);
        assert_eq!(request.path, "/v1/track");
        assert_eq!(request.encoding, BodyEncoding::Base64);
    }

    #[test]
    fn test_short_form_event() {
        let event: ProxyEvent = serde_json::from_str(
            r#"{"method":"GET","path":"/v1/projects/x","headers":{"host":"h"},"body":""}"#,
        )
        .unwrap();
        let request = SyntheticRequest::from(event);

        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/v1/projects/x");
        assert_eq!(request.encoding, BodyEncoding::Raw);
        assert_eq!(request.headers["host"], "h");
    }

    #[test]
    fn test_path_falls_back_and_gains_slash() {
        let mut params = HashMap::new();
        params.insert(PROXY_PATH_PARAM.to_string(), String::new());
        let event = ProxyEvent {
            http_method: "GET".into(),
            path: Some("v1/track".into()),
            path_parameters: Some(params),
            ..Default::default()
        };
        assert_eq!(SyntheticRequest::from(event).path, "/v1/track");

        let empty = SyntheticRequest::from(ProxyEvent::default());
        assert_eq!(empty.path, "/");
    }

    #[test]
    fn test_query_parameters_are_sorted_and_encoded() {
        let mut params = HashMap::new();
        params.insert("b".to_string(), "x y".to_string());
        params.insert("a".to_string(), "1&2".to_string());
        let event = ProxyEvent {
            query_string_parameters: Some(params),
            ..Default::default()
        };

        assert_eq!(
            SyntheticRequest::from(event).query.as_deref(),
            Some("a=1%262&b=x+y")
        );
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let mut headers = BTreeMap::new();
        headers.insert("x".to_string(), "y".to_string());
        let response = EventResponse {
            status_code: 200,
            headers,
            is_base64_encoded: false,
            body: String::new(),
        };

        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":200,"headers":{"x":"y"},"isBase64Encoded":false,"body":""}"#
        );
    }
}
