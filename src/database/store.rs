use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{ConnectionRow, NewConnection};

/// Errors from a connection store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            other => StoreError::QueryError(other.to_string()),
        }
    }
}

/// Persistent home of connection rows. Every operation is scoped by owner.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// All rows owned by `user_id`, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>, StoreError>;

    /// Inserts a row and returns it as stored
    async fn insert(&self, connection: NewConnection) -> Result<ConnectionRow, StoreError>;

    /// Deletes the row with `id` owned by `user_id`; returns rows affected
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError>;

    /// Connectivity check for health reporting
    async fn ping(&self) -> Result<(), StoreError>;
}
