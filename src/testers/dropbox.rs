use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use super::{field, ConnectionTester, TesterError};
use crate::cipher::CredentialBundle;

const SERVICE: &str = "Dropbox";

#[derive(Deserialize)]
struct CurrentAccount {
    #[serde(default)]
    account_id: String,
}

/// Fetches the current account with the access token
pub struct DropboxTester {
    client: reqwest::Client,
    endpoint: String,
}

impl DropboxTester {
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/2/users/get_current_account", api_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ConnectionTester for DropboxTester {
    async fn probe(&self, credentials: &CredentialBundle) -> Result<(), TesterError> {
        let token = field(credentials, "accessToken")?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body("null")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TesterError::Rejected { service: SERVICE, status: response.status().as_u16() });
        }

        let account: CurrentAccount = response.json().await?;
        if account.account_id.is_empty() {
            return Err(TesterError::UnexpectedResponse {
                service: SERVICE,
                reason: "response carried no account_id".to_string(),
            });
        }
        Ok(())
    }
}
