use thiserror::Error;

/// Credential cipher errors
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption key is not configured (set DATAPORT_ENCRYPTION_KEY)")]
    MissingKey,

    #[error("Encryption key must be 32 bytes, raw or base64 encoded (got {0} bytes)")]
    InvalidKey(usize),

    #[error("Failed to decrypt credentials: {0}")]
    Decryption(&'static str),

    #[error("Failed to serialize credentials: {0}")]
    Serialization(#[from] serde_json::Error),
}
