use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::cipher::{CredentialBundle, CredentialCipher};
use crate::database::{ConnectionRow, ConnectionStore, MemoryConnectionStore, NewConnection, StoreError};
use crate::testers::{ConnectionTester, TesterError};

pub fn test_cipher() -> CredentialCipher {
    CredentialCipher::new([7u8; 32])
}

pub fn s3_bundle() -> CredentialBundle {
    CredentialBundle::new()
        .with("accessKeyId", "k")
        .with("secretAccessKey", "s")
        .with("region", "us-east-1")
        .with("bucket", "b")
}

/// In-memory store whose reads and writes can be made to fail on demand
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryConnectionStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryConnectionStore {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConnectionStore for FlakyStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.list_for_user(user_id).await
    }

    async fn insert(&self, connection: NewConnection) -> Result<ConnectionRow, StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.insert(connection).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(user_id, id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Self::check(&self.fail_reads)
    }
}

/// Tester with a fixed verdict
pub struct StubTester {
    ok: bool,
}

impl StubTester {
    pub fn new(ok: bool) -> Self {
        Self { ok }
    }
}

#[async_trait]
impl ConnectionTester for StubTester {
    async fn probe(&self, _credentials: &CredentialBundle) -> Result<(), TesterError> {
        if self.ok {
            Ok(())
        } else {
            Err(TesterError::Rejected { service: "stub", status: 403 })
        }
    }
}
