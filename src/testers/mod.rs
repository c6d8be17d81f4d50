//! Connection testers: one probe per source type.
//!
//! A probe performs the cheapest authenticated call the vendor offers and
//! reports whether the credentials work. `TesterSet::test` collapses every
//! failure into `false`; the detail is only logged.

pub mod dropbox;
pub mod google_drive;
pub mod proxy;
pub mod s3;
pub mod snowflake;

pub use dropbox::DropboxTester;
pub use google_drive::GoogleDriveTester;
pub use proxy::ProxyTester;
pub use s3::S3Tester;
pub use snowflake::SnowflakeTester;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cipher::CredentialBundle;
use crate::config::TesterConfig;
use crate::types::SourceType;

#[derive(Debug, Error)]
pub enum TesterError {
    #[error("Missing credential field: {0}")]
    MissingField(&'static str),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} rejected the credentials (HTTP {status})")]
    Rejected { service: &'static str, status: u16 },

    #[error("Unexpected response from {service}: {reason}")]
    UnexpectedResponse { service: &'static str, reason: String },

    #[error("Invalid tester configuration: {0}")]
    Config(String),
}

/// Verifies one source type's credentials against the live service
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    async fn probe(&self, credentials: &CredentialBundle) -> Result<(), TesterError>;
}

/// Looks up a required, non-blank field
pub(crate) fn field<'a>(credentials: &'a CredentialBundle, name: &'static str) -> Result<&'a str, TesterError> {
    credentials
        .get(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(TesterError::MissingField(name))
}

/// Shared outbound HTTP client
pub fn http_client(config: &TesterConfig) -> Result<reqwest::Client, TesterError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!("dataport-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TesterError::Config(e.to_string()))
}

/// Dispatch table from source type to tester
#[derive(Default, Clone)]
pub struct TesterSet {
    testers: HashMap<SourceType, Arc<dyn ConnectionTester>>,
}

impl TesterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source_type: SourceType, tester: Arc<dyn ConnectionTester>) -> Self {
        self.testers.insert(source_type, tester);
        self
    }

    /// Every source type probed in-process. Used server-side.
    pub fn direct(config: &TesterConfig) -> Result<Self, TesterError> {
        let client = http_client(config)?;
        Ok(Self::new()
            .with(SourceType::Dropbox, Arc::new(DropboxTester::new(client.clone(), &config.dropbox_api_url)))
            .with(SourceType::AwsS3, Arc::new(S3Tester::new(client.clone(), config.s3_endpoint.clone())))
            .with(
                SourceType::GoogleDrive,
                Arc::new(GoogleDriveTester::new(
                    client.clone(),
                    &config.google_token_url,
                    &config.google_drive_api_url,
                )),
            )
            .with(
                SourceType::Snowflake,
                Arc::new(SnowflakeTester::new(client, config.snowflake_base_url.clone())),
            ))
    }

    /// Dropbox and S3 probed in-process; Google Drive and Snowflake go through
    /// the server's test endpoints so their vendor calls stay server-side.
    pub fn client(config: &TesterConfig) -> Result<Self, TesterError> {
        let client = http_client(config)?;
        let base = config.proxy_base_url.trim_end_matches('/');
        Ok(Self::new()
            .with(SourceType::Dropbox, Arc::new(DropboxTester::new(client.clone(), &config.dropbox_api_url)))
            .with(SourceType::AwsS3, Arc::new(S3Tester::new(client.clone(), config.s3_endpoint.clone())))
            .with(
                SourceType::GoogleDrive,
                Arc::new(ProxyTester::new(
                    client.clone(),
                    format!("{}/api/test-google-drive-connection", base),
                )),
            )
            .with(
                SourceType::Snowflake,
                Arc::new(ProxyTester::new(client, format!("{}/api/test-snowflake-connection", base))),
            ))
    }

    pub fn get(&self, source_type: SourceType) -> Option<&Arc<dyn ConnectionTester>> {
        self.testers.get(&source_type)
    }

    /// Probes the credentials; any failure is reported as `false`
    pub async fn test(&self, source_type: SourceType, credentials: &CredentialBundle) -> bool {
        let Some(tester) = self.get(source_type) else {
            warn!("No tester registered for {} connections", source_type);
            return false;
        };

        match tester.probe(credentials).await {
            Ok(()) => {
                debug!("{} connection test passed", source_type);
                true
            }
            Err(e) => {
                warn!("Failed to test {} connection: {}", source_type, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTester;

    #[tokio::test]
    async fn errors_collapse_to_false() {
        let set = TesterSet::new()
            .with(SourceType::Dropbox, Arc::new(StubTester::new(true)))
            .with(SourceType::AwsS3, Arc::new(StubTester::new(false)));
        let creds = CredentialBundle::new();

        assert!(set.test(SourceType::Dropbox, &creds).await);
        assert!(!set.test(SourceType::AwsS3, &creds).await);
        assert!(!set.test(SourceType::Snowflake, &creds).await);
    }

    #[test]
    fn field_rejects_blank_values() {
        let creds = CredentialBundle::new().with("accessToken", "  ");
        assert!(matches!(field(&creds, "accessToken"), Err(TesterError::MissingField("accessToken"))));
        assert!(matches!(field(&creds, "other"), Err(TesterError::MissingField("other"))));
    }

    #[test]
    fn builds_both_wirings() {
        let config = TesterConfig::default();
        let direct = TesterSet::direct(&config).unwrap();
        let client = TesterSet::client(&config).unwrap();
        for t in SourceType::ALL {
            assert!(direct.get(t).is_some());
            assert!(client.get(t).is_some());
        }
    }
}
