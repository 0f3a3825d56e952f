//! Request body encryption subsystem.
//!
//! # Data Flow
//! ```text
//! JSON body routed to an encrypting target
//!     → transform.rs (parse, collect `properties` as strings)
//!     → envelope.rs (Envelope + wildcard encrypt operation)
//!     → EncryptionEngine::execute (opaque, in place)
//!     → transform.rs (write ciphertext back, re-serialize)
//! ```
//!
//! # Design Decisions
//! - Fail open on the body: any error forwards the original bytes
//! - The engine is a trait object; the cryptographic scheme is its business
//! - Property values are sent as strings; original JSON types are not restored

pub mod cipher;
pub mod envelope;
pub mod transform;

use std::sync::Arc;

use crate::config::{ConfigError, ProxyConfig};
use crate::config::validation::ValidationError;

pub use cipher::XChaChaEngine;
pub use envelope::{DisabledEngine, EncryptionEngine, EngineError, Envelope};
pub use transform::{TransformError, Transformed};

/// Build the engine for a configuration.
///
/// Fails when a target encrypts but no usable key is configured. When no
/// target encrypts and no key is set, the disabled engine is returned.
pub fn engine_from_config(config: &ProxyConfig) -> Result<Arc<dyn EncryptionEngine>, ConfigError> {
    match config.encryption.resolve_key() {
        Some(key) => {
            let engine = XChaChaEngine::from_base64(&key)
                .map_err(|e| ValidationError::InvalidEncryptionKey(e.0))?;
            Ok(Arc::new(engine))
        }
        None if config.needs_encryption() => Err(ValidationError::MissingEncryptionKey(
            config.encryption.key_env.clone(),
        )
        .into()),
        None => Ok(Arc::new(DisabledEngine)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    fn config_without_key() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.encryption.key_env = "HTTP_ENC_PROXY_TEST_NO_SUCH_VAR".into();
        config
    }

    #[test]
    fn test_missing_key_is_rejected_when_encrypting() {
        let err = engine_from_config(&config_without_key()).err().unwrap();
        assert!(err.to_string().contains("no key is configured"));
    }

    #[test]
    fn test_no_key_needed_without_encrypting_targets() {
        let mut config = config_without_key();
        for target in &mut config.targets {
            target.encrypt_json = false;
        }
        assert!(engine_from_config(&config).is_ok());
    }

    #[test]
    fn test_inline_key() {
        let mut config = config_without_key();
        config.encryption.key = Some(general_purpose::STANDARD.encode([3u8; 32]));
        assert!(engine_from_config(&config).is_ok());

        config.encryption.key = Some("short".into());
        assert!(engine_from_config(&config).is_err());
    }
}
