//! Envelope exchanged with the encryption engine.
//!
//! The engine receives plaintext field values plus a list of operations and
//! rewrites the values in place. The proxy never looks inside the transform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source selector matching every key in the envelope.
pub const WILDCARD_SOURCE: &str = "*";

/// Failure reported by an engine. Carries only a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Encryption engine failed: {0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Field values plus the operations to apply to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: HashMap<String, String>,
    pub operations: Vec<Operation>,
}

/// One requested transform and the fields it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<Encrypt>,
    pub data_location: DataLocation,
}

/// Marker requesting encryption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encrypt {}

/// Which envelope keys an operation reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLocation {
    pub source: String,
}

impl DataLocation {
    pub fn wildcard() -> Self {
        Self {
            source: WILDCARD_SOURCE.to_string(),
        }
    }

    pub fn selects(&self, key: &str) -> bool {
        self.source == WILDCARD_SOURCE || self.source == key
    }
}

impl Envelope {
    /// An envelope asking for every field to be encrypted.
    pub fn encrypt_all(data: HashMap<String, String>) -> Self {
        Self {
            data,
            operations: vec![Operation {
                encrypt: Some(Encrypt {}),
                data_location: DataLocation::wildcard(),
            }],
        }
    }

    /// Replace every value selected by an encrypt operation with `seal(value)`.
    ///
    /// A value is transformed at most once even if several operations select it.
    /// On error the envelope may be partially rewritten; callers discard it.
    pub fn encrypt_selected<F>(&mut self, mut seal: F) -> Result<(), EngineError>
    where
        F: FnMut(&str) -> Result<String, EngineError>,
    {
        let mut keys: Vec<String> = self
            .data
            .keys()
            .filter(|key| {
                self.operations
                    .iter()
                    .any(|op| op.encrypt.is_some() && op.data_location.selects(key))
            })
            .cloned()
            .collect();
        keys.sort();

        for key in keys {
            if let Some(value) = self.data.get_mut(&key) {
                *value = seal(value)?;
            }
        }
        Ok(())
    }
}

/// The external encryption capability.
pub trait EncryptionEngine: Send + Sync {
    /// Transform the envelope's data in place.
    fn execute(&self, envelope: &mut Envelope) -> Result<(), EngineError>;
}

/// Engine used when no target encrypts. Every call fails, so any body that
/// does reach it is forwarded unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEngine;

impl EncryptionEngine for DisabledEngine {
    fn execute(&self, _envelope: &mut Envelope) -> Result<(), EngineError> {
        Err(EngineError::new("no encryption key configured"))
    }
}
