use serde::{Deserialize, Serialize};

use super::error::CipherError;

/// Stored form of an encrypted credential bundle.
///
/// All three parts are base64 (standard alphabet, padded):
/// - `iv`: 16 random bytes, fresh per encryption
/// - `data`: AES-256-CBC ciphertext with PKCS#7 padding
/// - `tag`: HMAC-SHA256 over `iv || data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub iv: String,
    pub data: String,
    pub tag: String,
}

impl Envelope {
    /// Text written to the `credentials` column
    pub fn to_json(&self) -> Result<String, CipherError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, CipherError> {
        serde_json::from_str(text).map_err(|_| CipherError::Decryption("malformed envelope"))
    }
}
