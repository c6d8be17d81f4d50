use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{ConnectionRow, NewConnection};
use crate::database::store::{ConnectionStore, StoreError};

/// Process-local store for development runs without Postgres
#[derive(Default)]
pub struct MemoryConnectionStore {
    rows: RwLock<Vec<ConnectionRow>>,
}

impl MemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all users
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Writes a row verbatim, bypassing the registry
    pub async fn seed(&self, row: ConnectionRow) {
        self.rows.write().await.push(row);
    }
}

#[async_trait]
impl ConnectionStore for MemoryConnectionStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn insert(&self, connection: NewConnection) -> Result<ConnectionRow, StoreError> {
        let row = ConnectionRow {
            id: Uuid::new_v4(),
            user_id: connection.user_id,
            source_type: connection.source_type.as_str().to_string(),
            name: connection.name,
            credentials: connection.credentials,
            status: connection.status.as_str().to_string(),
            created_at: Utc::now(),
            last_sync: None,
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.user_id == user_id));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConnectionStatus, SourceType};

    fn new_connection(user_id: Uuid) -> NewConnection {
        NewConnection {
            user_id,
            source_type: SourceType::Dropbox,
            name: "Dropbox".to_string(),
            credentials: "{}".to_string(),
            status: ConnectionStatus::Connected,
        }
    }

    #[tokio::test]
    async fn rows_are_scoped_by_user() {
        let store = MemoryConnectionStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.insert(new_connection(alice)).await.unwrap();
        store.insert(new_connection(bob)).await.unwrap();

        let rows = store.list_for_user(alice).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, alice);
        assert_eq!(rows[0].source_type, "dropbox");
    }

    #[tokio::test]
    async fn delete_requires_owner() {
        let store = MemoryConnectionStore::new();
        let alice = Uuid::new_v4();
        let row = store.insert(new_connection(alice)).await.unwrap();

        assert_eq!(store.delete(Uuid::new_v4(), row.id).await.unwrap(), 0);
        assert_eq!(store.delete(alice, row.id).await.unwrap(), 1);
        assert_eq!(store.delete(alice, row.id).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }
}
