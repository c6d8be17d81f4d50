use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{ConnectionRow, NewConnection};
use crate::database::store::{ConnectionStore, StoreError};

const SELECT_COLUMNS: &str = "id, user_id, type, name, credentials, status, created_at, last_sync";

/// `connections` table in Postgres
#[derive(Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>, StoreError> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {} FROM connections WHERE user_id = $1 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert(&self, connection: NewConnection) -> Result<ConnectionRow, StoreError> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            "INSERT INTO connections (user_id, type, name, credentials, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(connection.user_id)
        .bind(connection.source_type.as_str())
        .bind(&connection.name)
        .bind(&connection.credentials)
        .bind(connection.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM connections WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
