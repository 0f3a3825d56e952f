//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable consulted for the encryption key when none is inlined.
pub const DEFAULT_KEY_ENV: &str = "HTTP_ENC_PROXY_KEY";

/// Root configuration for the encryption proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Path prefix stripped from inbound requests before routing
    /// (e.g. a mount path imposed by a front-door gateway).
    pub route_prefix: String,

    /// Verbose logging.
    pub debug: bool,

    /// Ordered routing targets. First match wins.
    pub targets: Vec<TargetConfig>,

    /// Encryption engine settings.
    pub encryption: EncryptionConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            route_prefix: String::new(),
            debug: false,
            targets: default_targets(),
            encryption: EncryptionConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Returns true if any target asks for JSON body encryption.
    pub fn needs_encryption(&self) -> bool {
        self.targets.iter().any(|t| t.encrypt_json)
    }
}

/// The stock routing table: CDN paths pass through, everything else is
/// encrypted and sent to the API.
fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig {
            name: Some("cdn".to_string()),
            path_prefix: None,
            path_prefixes: vec!["/v1/projects".to_string(), "/analytics.js/v1".to_string()],
            destination: "https://cdn.segment.com".to_string(),
            encrypt_json: false,
            drop_content_encoding: true,
        },
        TargetConfig {
            name: Some("api".to_string()),
            path_prefix: None,
            path_prefixes: Vec::new(),
            destination: "https://api.segment.io".to_string(),
            encrypt_json: true,
            drop_content_encoding: false,
        },
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4800,
        }
    }
}

/// One routing target.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Identifier for logs and metrics. Defaults to the destination.
    #[serde(default)]
    pub name: Option<String>,

    /// Single path prefix (older config layout). Merged ahead of `path_prefixes`.
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Path prefixes, OR-ed. Empty = catch-all.
    #[serde(default)]
    pub path_prefixes: Vec<String>,

    /// Backend base URL (scheme, host, base path, base query).
    pub destination: String,

    /// Encrypt `properties` of JSON request bodies.
    #[serde(default)]
    pub encrypt_json: bool,

    /// Remove `content-encoding` from backend responses.
    #[serde(default)]
    pub drop_content_encoding: bool,
}

impl TargetConfig {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.destination.clone())
    }

    /// All prefixes in match order.
    pub fn all_prefixes(&self) -> Vec<String> {
        self.path_prefix
            .iter()
            .chain(self.path_prefixes.iter())
            .cloned()
            .collect()
    }

    pub fn is_catch_all(&self) -> bool {
        self.path_prefix.is_none() && self.path_prefixes.is_empty()
    }
}

/// Encryption engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Base64-encoded 256-bit key. Prefer `key_env` outside of tests.
    pub key: Option<String>,

    /// Environment variable holding the base64 key.
    pub key_env: String,
}

impl EncryptionConfig {
    /// The inlined key, or the value of `key_env` if set.
    pub fn resolve_key(&self) -> Option<String> {
        self.key
            .clone()
            .or_else(|| std::env::var(&self.key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            key: None,
            key_env: DEFAULT_KEY_ENV.to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size buffered for encryption, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
