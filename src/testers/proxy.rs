use async_trait::async_trait;
use serde::Deserialize;

use super::{ConnectionTester, TesterError};
use crate::cipher::CredentialBundle;

const SERVICE: &str = "connection test endpoint";

#[derive(Deserialize)]
struct ProbeReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Forwards the bundle to a server-side `/api/test-*-connection` endpoint
pub struct ProxyTester {
    client: reqwest::Client,
    url: String,
}

impl ProxyTester {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConnectionTester for ProxyTester {
    async fn probe(&self, credentials: &CredentialBundle) -> Result<(), TesterError> {
        let response = self.client.post(&self.url).json(credentials).send().await?;

        if !response.status().is_success() {
            return Err(TesterError::Rejected { service: SERVICE, status: response.status().as_u16() });
        }

        let reply: ProbeReply = response.json().await?;
        if reply.success {
            Ok(())
        } else {
            Err(TesterError::UnexpectedResponse {
                service: SERVICE,
                reason: reply.error.unwrap_or_else(|| "success=false".to_string()),
            })
        }
    }
}
