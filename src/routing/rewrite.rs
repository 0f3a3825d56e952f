//! Upstream URI composition.
//!
//! # Responsibilities
//! - Join a destination base path with the request path
//! - Merge destination and request query strings
//! - Build the absolute upstream URI for a resolved target

use std::fmt;

use axum::http::uri::{InvalidUri, Uri};
use thiserror::Error;
use url::Url;

/// Join two path fragments with exactly one `/` at the seam.
pub fn join_path(base: &str, path: &str) -> String {
    let base_slash = base.ends_with('/');
    let path_slash = path.starts_with('/');
    match (base_slash, path_slash) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Merge query strings, destination first. Empty sides are dropped.
pub fn merge_query(destination: &str, request: &str) -> String {
    if destination.is_empty() || request.is_empty() {
        format!("{}{}", destination, request)
    } else {
        format!("{}&{}", destination, request)
    }
}

/// Errors raised while parsing a destination URL.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// The string is not a valid absolute URL.
    #[error("Invalid destination URL: {0}")]
    Parse(#[from] url::ParseError),

    /// Only plain HTTP and HTTPS backends are supported.
    #[error("Unsupported destination scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL has no host component.
    #[error("Destination URL has no host")]
    MissingHost,
}

/// A pre-split backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    scheme: String,
    authority: String,
    base_path: String,
    base_query: String,
}

impl Destination {
    /// Parse a destination from an absolute URL string.
    pub fn parse(input: &str) -> Result<Self, DestinationError> {
        Self::from_url(&Url::parse(input)?)
    }

    pub fn from_url(url: &Url) -> Result<Self, DestinationError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(DestinationError::UnsupportedScheme(scheme.to_string()));
        }
        let host = url.host_str().ok_or(DestinationError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().unwrap_or_default().to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host and optional explicit port, as sent in the `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn base_query(&self) -> &str {
        &self.base_query
    }

    /// Build the upstream URI for a request path and optional query.
    pub fn upstream_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, InvalidUri> {
        let path = join_path(&self.base_path, path);
        let query = merge_query(&self.base_query, query.unwrap_or_default());

        let uri = if query.is_empty() {
            format!("{}://{}{}", self.scheme, self.authority, path)
        } else {
            format!("{}://{}{}?{}", self.scheme, self.authority, path, query)
        };
        uri.parse()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_single_slash() {
        assert_eq!(join_path("/a/", "/b"), "/a/b");
        assert_eq!(join_path("/a", "b"), "/a/b");
        assert_eq!(join_path("/a/", "b"), "/a/b");
        assert_eq!(join_path("/a", "/b"), "/a/b");
    }

    #[test]
    fn test_join_path_root_base() {
        assert_eq!(join_path("/", "/v1/track"), "/v1/track");
        assert_eq!(join_path("", "/v1/track"), "/v1/track");
        assert_eq!(join_path("/base", ""), "/base/");
    }

    #[test]
    fn test_merge_query() {
        assert_eq!(merge_query("", "x=1"), "x=1");
        assert_eq!(merge_query("y=2", ""), "y=2");
        assert_eq!(merge_query("y=2", "x=1"), "y=2&x=1");
        assert_eq!(merge_query("", ""), "");
    }

    #[test]
    fn test_destination_parse() {
        let dest = Destination::parse("https://api.example.com:8443/base?key=abc").unwrap();
        assert_eq!(dest.scheme(), "https");
        assert_eq!(dest.authority(), "api.example.com:8443");
        assert_eq!(dest.base_path(), "/base");
        assert_eq!(dest.base_query(), "key=abc");

        // Default port is not repeated in the authority
        let dest = Destination::parse("https://cdn.example.com:443").unwrap();
        assert_eq!(dest.authority(), "cdn.example.com");
    }

    #[test]
    fn test_destination_rejects_bad_urls() {
        assert!(matches!(
            Destination::parse("ftp://files.example.com"),
            Err(DestinationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            Destination::parse("not a url"),
            Err(DestinationError::Parse(_))
        ));
    }

    #[test]
    fn test_upstream_uri() {
        let dest = Destination::parse("http://127.0.0.1:3000/base?k=v").unwrap();

        let uri = dest.upstream_uri("/v1/track", Some("a=1")).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:3000/base/v1/track?k=v&a=1");

        let dest = Destination::parse("https://api.example.com").unwrap();
        let uri = dest.upstream_uri("/v1/track", None).unwrap();
        assert_eq!(uri.to_string(), "https://api.example.com/v1/track");
    }
}
