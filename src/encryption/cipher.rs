//! XChaCha20-Poly1305 field engine.
//!
//! Each value is sealed with a fresh 192-bit random nonce and emitted as
//! `base64(nonce || ciphertext)`, so equal plaintexts never produce equal
//! ciphertexts.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};

use crate::encryption::envelope::{EncryptionEngine, EngineError, Envelope};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// Engine sealing every selected envelope value with one symmetric key.
#[derive(Clone)]
pub struct XChaChaEngine {
    cipher: XChaCha20Poly1305,
}

impl XChaChaEngine {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Build from a base64-encoded 256-bit key.
    pub fn from_base64(encoded: &str) -> Result<Self, EngineError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| EngineError::new(format!("key is not valid base64: {}", e)))?;
        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            EngineError::new(format!("key must be {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Self::new(&key))
    }

    fn seal(&self, plaintext: &str) -> Result<String, EngineError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| EngineError::new(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(sealed))
    }

    /// Reverse of the per-value seal.
    pub fn open(&self, sealed: &str) -> Result<String, EngineError> {
        let bytes = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|e| EngineError::new(e.to_string()))?;
        if bytes.len() < NONCE_LEN {
            return Err(EngineError::new("ciphertext shorter than nonce"));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|e| EngineError::new(e.to_string()))?;
        String::from_utf8(plaintext).map_err(|e| EngineError::new(e.to_string()))
    }
}

impl EncryptionEngine for XChaChaEngine {
    fn execute(&self, envelope: &mut Envelope) -> Result<(), EngineError> {
        envelope.encrypt_selected(|value| self.seal(value))
    }
}

impl fmt::Debug for XChaChaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XChaChaEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn envelope(value: &str) -> Envelope {
        let mut data = HashMap::new();
        data.insert("email".to_string(), value.to_string());
        Envelope::encrypt_all(data)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let engine = XChaChaEngine::new(&[7u8; 32]);
        let mut env = envelope("user@example.com");

        engine.execute(&mut env).unwrap();
        let sealed = &env.data["email"];
        assert_ne!(sealed, "user@example.com");
        assert_eq!(engine.open(sealed).unwrap(), "user@example.com");
    }

    #[test]
    fn test_equal_plaintexts_differ() {
        let engine = XChaChaEngine::new(&[7u8; 32]);
        let mut a = envelope("same");
        let mut b = envelope("same");
        engine.execute(&mut a).unwrap();
        engine.execute(&mut b).unwrap();

        assert_ne!(a.data["email"], b.data["email"]);
    }

    #[test]
    fn test_wrong_key_fails() {
        let mut env = envelope("secret");
        XChaChaEngine::new(&[1u8; 32]).execute(&mut env).unwrap();

        assert!(XChaChaEngine::new(&[2u8; 32]).open(&env.data["email"]).is_err());
    }

    #[test]
    fn test_from_base64_checks_length() {
        let good = general_purpose::STANDARD.encode([9u8; 32]);
        assert!(XChaChaEngine::from_base64(&good).is_ok());

        let short = general_purpose::STANDARD.encode([9u8; 16]);
        let err = XChaChaEngine::from_base64(&short).unwrap_err();
        assert!(err.to_string().contains("must be 32 bytes"));

        assert!(XChaChaEngine::from_base64("%%%").is_err());
    }
}
