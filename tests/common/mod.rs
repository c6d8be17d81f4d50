#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::Router;
use uuid::Uuid;

use dataport_api::auth::JwtVerifier;
use dataport_api::cipher::{CredentialBundle, CredentialCipher};
use dataport_api::config::AppConfig;
use dataport_api::database::{ConnectionStore, MemoryConnectionStore};
use dataport_api::server;
use dataport_api::state::AppState;
use dataport_api::testers::{ConnectionTester, TesterError, TesterSet};
use dataport_api::types::SourceType;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ENCRYPTION_KEY: [u8; 32] = [42u8; 32];

/// API served in-process on an ephemeral port, backed by an in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryConnectionStore>,
    pub state: AppState,
}

impl TestServer {
    pub async fn spawn(testers: TesterSet) -> Result<Self> {
        let store = Arc::new(MemoryConnectionStore::new());
        let shared: Arc<dyn ConnectionStore> = store.clone();
        let state = AppState::new(
            shared,
            CredentialCipher::new(ENCRYPTION_KEY),
            testers,
            JwtVerifier::new(JWT_SECRET, None)?,
        );

        let base_url = serve(server::app(state.clone(), &AppConfig::development())).await?;
        Ok(Self { base_url, store, state })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        JwtVerifier::new(JWT_SECRET, None)
            .and_then(|v| v.issue(user_id, chrono::Duration::minutes(10)))
            .expect("failed to issue test token")
    }
}

/// Serves `router` on 127.0.0.1:0 and returns its base URL
pub async fn serve(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{}", addr))
}

/// Tester with a fixed verdict
pub struct FixedTester(pub bool);

#[async_trait]
impl ConnectionTester for FixedTester {
    async fn probe(&self, _credentials: &CredentialBundle) -> Result<(), TesterError> {
        if self.0 {
            Ok(())
        } else {
            Err(TesterError::Rejected { service: "fixed", status: 403 })
        }
    }
}

/// Every source type answered by `FixedTester(verdict)`
pub fn fixed_testers(verdict: bool) -> TesterSet {
    SourceType::ALL
        .iter()
        .fold(TesterSet::new(), |set, s| set.with(*s, Arc::new(FixedTester(verdict))))
}

pub fn s3_credentials() -> serde_json::Value {
    serde_json::json!({
        "accessKeyId": "AKIAEXAMPLE",
        "secretAccessKey": "wJalrXUtnFEMI-example-secret",
        "region": "us-east-1",
        "bucket": "reports"
    })
}
