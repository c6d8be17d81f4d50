//! Per-user list of configured data-source connections.
//!
//! The in-memory list only changes after the store has accepted the change,
//! so a failed write or load leaves it at its last known-good state.

pub mod error;

pub use error::RegistryError;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cipher::{CredentialBundle, CredentialCipher};
use crate::database::{ConnectionRow, ConnectionStore, NewConnection};
use crate::testers::TesterSet;
use crate::types::{ConnectionStatus, SourceType};

/// A connection with its credentials decrypted
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub name: String,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub credentials: CredentialBundle,
}

/// A stored row that could not be turned into a record
#[derive(Debug, Clone, Serialize)]
pub struct UnreadableConnection {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub source_type: String,
    pub reason: String,
}

pub struct ConnectionRegistry {
    user_id: Uuid,
    store: Arc<dyn ConnectionStore>,
    cipher: Arc<CredentialCipher>,
    testers: Arc<TesterSet>,
    connections: Vec<ConnectionRecord>,
    unreadable: Vec<UnreadableConnection>,
    loaded: bool,
}

impl ConnectionRegistry {
    /// Empty registry for one user's session; call `load` to populate it
    pub fn new(
        user_id: Uuid,
        store: Arc<dyn ConnectionStore>,
        cipher: Arc<CredentialCipher>,
        testers: Arc<TesterSet>,
    ) -> Self {
        Self {
            user_id,
            store,
            cipher,
            testers,
            connections: Vec::new(),
            unreadable: Vec::new(),
            loaded: false,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn connections(&self) -> &[ConnectionRecord] {
        &self.connections
    }

    pub fn has_connections(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Whether a `load` has completed successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Rows skipped by the last `load`
    pub fn unreadable(&self) -> &[UnreadableConnection] {
        &self.unreadable
    }

    pub fn get(&self, id: Uuid) -> Option<&ConnectionRecord> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Replaces the list with the user's stored connections.
    ///
    /// On store failure the current list is kept. Rows that fail to decrypt
    /// are skipped and reported through `unreadable()`.
    pub async fn load(&mut self) -> Result<&[ConnectionRecord], RegistryError> {
        let rows = self.store.list_for_user(self.user_id).await.map_err(|e| {
            warn!("Error loading connections for user {}: {}", self.user_id, e);
            RegistryError::Load(e)
        })?;

        let mut connections = Vec::with_capacity(rows.len());
        let mut unreadable = Vec::new();
        for row in rows {
            let id = row.id;
            let source_type = row.source_type.clone();
            match self.decode_row(row) {
                Ok(record) => connections.push(record),
                Err(e) => {
                    warn!("{}", e);
                    unreadable.push(UnreadableConnection {
                        id,
                        source_type,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Loaded {} connections for user {} ({} unreadable)",
            connections.len(),
            self.user_id,
            unreadable.len()
        );
        self.connections = connections;
        self.unreadable = unreadable;
        self.loaded = true;
        Ok(&self.connections)
    }

    /// Encrypts and stores a new connection, then appends it to the list
    pub async fn add(
        &mut self,
        source_type: SourceType,
        credentials: CredentialBundle,
    ) -> Result<ConnectionRecord, RegistryError> {
        let missing = credentials.missing_fields(source_type.required_fields());
        if !missing.is_empty() {
            return Err(RegistryError::Validation { source_type, fields: missing });
        }

        let status = ConnectionStatus::Connected;
        let envelope = self
            .cipher
            .encrypt(&credentials)
            .and_then(|e| e.to_json())
            .map_err(RegistryError::Encryption)?;

        let row = self
            .store
            .insert(NewConnection {
                user_id: self.user_id,
                source_type,
                name: source_type.display_name().to_string(),
                credentials: envelope,
                status,
            })
            .await
            .map_err(|e| {
                warn!("Error adding {} connection for user {}: {}", source_type, self.user_id, e);
                RegistryError::Persist(e)
            })?;

        if row.status.parse::<ConnectionStatus>().ok() != Some(status) {
            warn!(
                "Store returned status '{}' for new connection {}; keeping '{}'",
                row.status, row.id, status
            );
        }

        let record = ConnectionRecord {
            id: row.id,
            source_type,
            name: row.name,
            status,
            created_at: row.created_at,
            last_sync: row.last_sync,
            credentials,
        };

        info!("Added {} connection {} for user {}", source_type, record.id, self.user_id);
        self.connections.push(record.clone());
        Ok(record)
    }

    /// Deletes the connection from the store, then from the list.
    ///
    /// An id the store does not know (zero rows affected) is not an error.
    pub async fn remove(&mut self, id: Uuid) -> Result<(), RegistryError> {
        let affected = self.store.delete(self.user_id, id).await.map_err(|e| {
            warn!("Error removing connection {} for user {}: {}", id, self.user_id, e);
            RegistryError::Persist(e)
        })?;

        if affected == 0 {
            debug!("Connection {} not found for user {}; nothing deleted", id, self.user_id);
        } else {
            info!("Removed connection {} for user {}", id, self.user_id);
        }

        self.connections.retain(|c| c.id != id);
        Ok(())
    }

    /// Checks credentials against the live service without touching any state
    pub async fn test(&self, source_type: SourceType, credentials: &CredentialBundle) -> bool {
        self.testers.test(source_type, credentials).await
    }

    fn decode_row(&self, row: ConnectionRow) -> Result<ConnectionRecord, RegistryError> {
        let corrupt = |reason: String| RegistryError::Decryption { id: row.id, reason };

        let source_type = row
            .source_type
            .parse::<SourceType>()
            .map_err(|e| corrupt(e.to_string()))?;
        let status = row.status.parse::<ConnectionStatus>().map_err(corrupt)?;
        let credentials = self
            .cipher
            .decrypt_str(&row.credentials)
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(ConnectionRecord {
            id: row.id,
            source_type,
            name: row.name,
            status,
            created_at: row.created_at,
            last_sync: row.last_sync,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryConnectionStore, StoreError};
    use crate::testing::{s3_bundle, test_cipher, FlakyStore, StubTester};

    fn registry(store: Arc<FlakyStore>, probe_ok: bool) -> ConnectionRegistry {
        let testers = TesterSet::new()
            .with(SourceType::AwsS3, Arc::new(StubTester::new(probe_ok)))
            .with(SourceType::Dropbox, Arc::new(StubTester::new(probe_ok)));
        ConnectionRegistry::new(Uuid::new_v4(), store, Arc::new(test_cipher()), Arc::new(testers))
    }

    #[tokio::test]
    async fn new_user_starts_empty() {
        let mut reg = registry(Arc::new(FlakyStore::new()), true);
        assert!(!reg.is_loaded());
        assert!(reg.load().await.unwrap().is_empty());
        assert!(reg.is_loaded());
        assert!(!reg.has_connections());
    }

    #[tokio::test]
    async fn add_appends_connected_record() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);

        let record = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        assert_eq!(reg.connections().len(), 1);
        assert_eq!(record.status, ConnectionStatus::Connected);
        assert_eq!(record.name, "AWS S3");
        assert_eq!(reg.get(record.id).unwrap().credentials, s3_bundle());
    }

    #[tokio::test]
    async fn stored_credentials_are_encrypted() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);
        let record = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        let rows = store.list_for_user(reg.user_id()).await.unwrap();
        assert_eq!(rows[0].id, record.id);
        assert!(!rows[0].credentials.contains("secretAccessKey"));
        assert_eq!(test_cipher().decrypt_str(&rows[0].credentials).unwrap(), s3_bundle());
    }

    #[tokio::test]
    async fn add_then_remove_restores_length() {
        let mut reg = registry(Arc::new(FlakyStore::new()), true);
        reg.add(SourceType::Dropbox, CredentialBundle::new().with("accessToken", "t")).await.unwrap();
        let before = reg.connections().len();

        let record = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();
        reg.remove(record.id).await.unwrap();

        assert_eq!(reg.connections().len(), before);
        assert!(reg.get(record.id).is_none());
    }

    #[tokio::test]
    async fn add_rejects_missing_fields_without_writing() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);

        let err = reg
            .add(SourceType::AwsS3, CredentialBundle::new().with("accessKeyId", "k"))
            .await
            .unwrap_err();

        match err {
            RegistryError::Validation { source_type, fields } => {
                assert_eq!(source_type, SourceType::AwsS3);
                assert_eq!(fields, vec!["secretAccessKey", "region", "bucket"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.inner().is_empty().await);
        assert!(reg.connections().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_leaves_list_untouched() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);
        reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        store.fail_writes(true);
        let err = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap_err();

        assert!(matches!(err, RegistryError::Persist(_)));
        assert_eq!(reg.connections().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_leaves_list_untouched() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);
        let record = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        store.fail_writes(true);
        let err = reg.remove(record.id).await.unwrap_err();

        assert!(matches!(err, RegistryError::Persist(_)));
        assert!(reg.get(record.id).is_some());
    }

    #[tokio::test]
    async fn removing_unknown_id_is_a_no_op() {
        let mut reg = registry(Arc::new(FlakyStore::new()), true);
        reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        reg.remove(Uuid::new_v4()).await.unwrap();
        assert_eq!(reg.connections().len(), 1);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_list() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);
        reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();
        reg.load().await.unwrap();

        store.fail_reads(true);
        let err = reg.load().await.unwrap_err();

        assert!(matches!(err, RegistryError::Load(_)));
        assert_eq!(reg.connections().len(), 1);
    }

    #[tokio::test]
    async fn load_skips_unreadable_rows() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);
        let good = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        let foreign = CredentialCipher::new([42u8; 32])
            .encrypt(&s3_bundle())
            .unwrap()
            .to_json()
            .unwrap();
        let bad_id = Uuid::new_v4();
        store
            .inner()
            .seed(ConnectionRow {
                id: bad_id,
                user_id: reg.user_id(),
                source_type: "aws-s3".to_string(),
                name: "AWS S3".to_string(),
                credentials: foreign,
                status: "connected".to_string(),
                created_at: Utc::now(),
                last_sync: None,
            })
            .await;

        let loaded = reg.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, good.id);
        assert_eq!(reg.unreadable().len(), 1);
        assert_eq!(reg.unreadable()[0].id, bad_id);
        assert!(reg.unreadable()[0].reason.starts_with("Failed to load connection"));
    }

    #[tokio::test]
    async fn load_reports_unknown_source_type() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), true);
        let envelope = test_cipher().encrypt(&s3_bundle()).unwrap().to_json().unwrap();
        store
            .inner()
            .seed(ConnectionRow {
                id: Uuid::new_v4(),
                user_id: reg.user_id(),
                source_type: "ftp".to_string(),
                name: "FTP".to_string(),
                credentials: envelope,
                status: "connected".to_string(),
                created_at: Utc::now(),
                last_sync: None,
            })
            .await;

        assert!(reg.load().await.unwrap().is_empty());
        assert!(reg.unreadable()[0].reason.contains("Unsupported connection type: ftp"));
    }

    #[tokio::test]
    async fn failed_test_returns_false_and_keeps_state() {
        let store = Arc::new(FlakyStore::new());
        let mut reg = registry(store.clone(), false);
        reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();

        let bad = CredentialBundle::new().with("accessKeyId", "nope");
        assert!(!reg.test(SourceType::AwsS3, &bad).await);
        assert_eq!(reg.connections().len(), 1);
        assert_eq!(store.inner().len().await, 1);
    }

    #[tokio::test]
    async fn test_passes_through_success() {
        let reg = registry(Arc::new(FlakyStore::new()), true);
        assert!(reg.test(SourceType::AwsS3, &s3_bundle()).await);
        // no tester registered for snowflake in this set
        assert!(!reg.test(SourceType::Snowflake, &s3_bundle()).await);
    }

    /// Store that echoes back a status it was never given
    struct RewritingStore(MemoryConnectionStore);

    #[async_trait::async_trait]
    impl ConnectionStore for RewritingStore {
        async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>, StoreError> {
            self.0.list_for_user(user_id).await
        }

        async fn insert(&self, connection: NewConnection) -> Result<ConnectionRow, StoreError> {
            let mut row = self.0.insert(connection).await?;
            row.status = "paused".to_string();
            Ok(row)
        }

        async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError> {
            self.0.delete(user_id, id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn add_keeps_written_status_when_store_echoes_another() {
        let testers = TesterSet::new();
        let mut reg = ConnectionRegistry::new(
            Uuid::new_v4(),
            Arc::new(RewritingStore(MemoryConnectionStore::new())),
            Arc::new(test_cipher()),
            Arc::new(testers),
        );

        let record = reg.add(SourceType::AwsS3, s3_bundle()).await.unwrap();
        assert_eq!(record.status, ConnectionStatus::Connected);
        assert_eq!(reg.connections()[0].status, ConnectionStatus::Connected);
    }
}
