use async_trait::async_trait;
use serde::Deserialize;

use super::{field, ConnectionTester, TesterError};
use crate::cipher::CredentialBundle;

const SERVICE: &str = "Google Drive";

#[derive(Deserialize)]
struct TokenReply {
    access_token: String,
}

/// Trades the refresh token for an access token, then lists one Drive file
pub struct GoogleDriveTester {
    client: reqwest::Client,
    token_url: String,
    files_url: String,
}

impl GoogleDriveTester {
    pub fn new(client: reqwest::Client, token_url: &str, drive_api_url: &str) -> Self {
        Self {
            client,
            token_url: token_url.to_string(),
            files_url: format!("{}/files", drive_api_url.trim_end_matches('/')),
        }
    }

    async fn access_token(&self, credentials: &CredentialBundle) -> Result<String, TesterError> {
        let form = [
            ("client_id", field(credentials, "clientId")?),
            ("client_secret", field(credentials, "clientSecret")?),
            ("refresh_token", field(credentials, "refreshToken")?),
            ("grant_type", "refresh_token"),
        ];

        let response = self.client.post(&self.token_url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(TesterError::Rejected { service: SERVICE, status: response.status().as_u16() });
        }

        let token: TokenReply = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl ConnectionTester for GoogleDriveTester {
    async fn probe(&self, credentials: &CredentialBundle) -> Result<(), TesterError> {
        let access_token = self.access_token(credentials).await?;

        let response = self
            .client
            .get(&self.files_url)
            .bearer_auth(&access_token)
            .query(&[("pageSize", "1"), ("fields", "files(id, name)")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TesterError::Rejected { service: SERVICE, status: response.status().as_u16() });
        }
        Ok(())
    }
}
