//! JSON body encryption.
//!
//! Reads the `properties` object of a JSON body, hands its values to the
//! engine as strings, and writes the ciphertext back in place. Every failure
//! leaves the caller holding the original bytes.

use std::collections::HashMap;

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::encryption::envelope::{EncryptionEngine, EngineError, Envelope};
use crate::routing::Target;

/// Key of the object whose values are encrypted.
pub const PROPERTIES_KEY: &str = "properties";

/// Errors that stop a body rewrite. The original body is forwarded instead.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Body with a `json` content type is not valid JSON.
    #[error("Failed to parse JSON body: {0}")]
    Parse(#[source] serde_json::Error),

    /// Engine rejected the envelope.
    #[error(transparent)]
    Encryption(#[from] EngineError),

    /// Rewritten document could not be serialized.
    #[error("Failed to re-encode JSON body: {0}")]
    Reencode(#[source] serde_json::Error),
}

/// Result of running a body through the transform.
#[derive(Debug)]
pub struct Transformed {
    /// Bytes to forward: rewritten on success, original otherwise.
    pub body: Bytes,
    /// Why the rewrite was skipped, if it was.
    pub error: Option<TransformError>,
}

impl Transformed {
    fn unchanged(body: Bytes) -> Self {
        Self { body, error: None }
    }

    pub fn is_rewritten(&self, original: &[u8]) -> bool {
        self.error.is_none() && self.body.as_ref() != original
    }
}

/// Returns true when a body with this content type, routed to `target`,
/// must be buffered and encrypted.
pub fn applies_to(content_type: Option<&str>, target: &Target) -> bool {
    target.encrypt_json() && content_type.is_some_and(|ct| ct.contains("json"))
}

/// Encrypt `properties` when the content type and target ask for it;
/// otherwise pass the body through untouched.
pub fn apply(
    body: Bytes,
    content_type: Option<&str>,
    target: &Target,
    engine: &dyn EncryptionEngine,
) -> Transformed {
    if !applies_to(content_type, target) {
        return Transformed::unchanged(body);
    }

    match encrypt_properties(&body, engine) {
        Ok(Some(rewritten)) => Transformed {
            body: Bytes::from(rewritten),
            error: None,
        },
        Ok(None) => Transformed::unchanged(body),
        Err(error) => Transformed {
            body,
            error: Some(error),
        },
    }
}

/// Rewrite `properties` values with ciphertext.
///
/// Returns `Ok(None)` when there is nothing to encrypt (no `properties`
/// object, or an empty one); the body must then be forwarded byte-for-byte.
pub fn encrypt_properties(
    body: &[u8],
    engine: &dyn EncryptionEngine,
) -> Result<Option<Vec<u8>>, TransformError> {
    let mut document: Value = serde_json::from_slice(body).map_err(TransformError::Parse)?;

    let Some(properties) = document
        .get_mut(PROPERTIES_KEY)
        .and_then(Value::as_object_mut)
    else {
        return Ok(None);
    };
    if properties.is_empty() {
        return Ok(None);
    }

    let data: HashMap<String, String> = properties
        .iter()
        .map(|(key, value)| (key.clone(), coerce_to_string(value)))
        .collect();

    let mut envelope = Envelope::encrypt_all(data);
    engine.execute(&mut envelope)?;

    for (key, ciphertext) in envelope.data {
        properties.insert(key, Value::String(ciphertext));
    }

    serde_json::to_vec(&document)
        .map(Some)
        .map_err(TransformError::Reencode)
}

/// Textual form of a property value. Original JSON types are not kept.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
