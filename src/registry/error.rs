use thiserror::Error;
use uuid::Uuid;

use crate::cipher::CipherError;
use crate::database::StoreError;
use crate::types::SourceType;

/// Connection registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to load connections: {0}")]
    Load(#[source] StoreError),

    #[error("Failed to save connection: {0}")]
    Persist(#[source] StoreError),

    #[error("Failed to encrypt credentials: {0}")]
    Encryption(#[source] CipherError),

    #[error("Failed to load connection {id}: {reason}")]
    Decryption { id: Uuid, reason: String },

    #[error("Missing required credentials for {source_type}: {}", .fields.join(", "))]
    Validation {
        source_type: SourceType,
        fields: Vec<&'static str>,
    },
}
