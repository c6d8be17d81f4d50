use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{field, ConnectionTester, TesterError};
use crate::cipher::CredentialBundle;

const SERVICE: &str = "Snowflake";
const HOST_SUFFIX: &str = "snowflakecomputing.com";

#[derive(Deserialize)]
struct SnowflakeReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
}

/// Logs in with username/password and runs `SELECT 1`
pub struct SnowflakeTester {
    client: reqwest::Client,
    base_url: Option<String>,
}

/// Where to reach an account and what name to log in with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTarget {
    pub base_url: String,
    pub account_name: String,
}

impl SnowflakeTester {
    /// `base_url` replaces the host derived from `accountUrl`
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    /// Accepts `xy12345`, `xy12345.us-east-1` or a full `https://...` account URL.
    ///
    /// Without a `base_url` override the host must be under `snowflakecomputing.com`.
    pub fn resolve_account(&self, account_url: &str) -> Result<AccountTarget, TesterError> {
        let input = account_url.trim();
        let invalid = || TesterError::Config(format!("invalid Snowflake account URL '{}'", input));

        let (host, origin) = if input.starts_with("http://") || input.starts_with("https://") {
            let parsed = url::Url::parse(input).map_err(|_| invalid())?;
            let host = parsed.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?.to_string();
            let origin = match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            };
            (host, origin)
        } else {
            let locator = input.trim_end_matches('/').to_ascii_lowercase();
            let locator_ok = !locator.is_empty()
                && locator
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_');
            if !locator_ok {
                return Err(invalid());
            }
            let host = if locator.ends_with(HOST_SUFFIX) {
                locator
            } else {
                format!("{}.{}", locator, HOST_SUFFIX)
            };
            let origin = format!("https://{}", host);
            (host, origin)
        };

        let base_url = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if host.ends_with(&format!(".{}", HOST_SUFFIX)) => origin,
            None => {
                return Err(TesterError::Config(format!(
                    "Snowflake host '{}' is not under {}",
                    host, HOST_SUFFIX
                )))
            }
        };

        let account_name = host
            .split('.')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?
            .to_uppercase();

        Ok(AccountTarget { base_url, account_name })
    }

    async fn login(
        &self,
        target: &AccountTarget,
        credentials: &CredentialBundle,
    ) -> Result<String, TesterError> {
        let body = json!({
            "data": {
                "CLIENT_APP_ID": "dataport-api",
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
                "ACCOUNT_NAME": target.account_name,
                "LOGIN_NAME": field(credentials, "username")?,
                "PASSWORD": field(credentials, "password")?,
            }
        });

        let response = self
            .client
            .post(format!("{}/session/v1/login-request", target.base_url))
            .query(&[
                ("warehouse", field(credentials, "warehouse")?),
                ("databaseName", field(credentials, "database")?),
            ])
            .json(&body)
            .send()
            .await?;

        let reply = Self::read_reply(response).await?;
        reply
            .data
            .and_then(|d| d.token)
            .ok_or_else(|| TesterError::UnexpectedResponse {
                service: SERVICE,
                reason: "login succeeded without a session token".to_string(),
            })
    }

    async fn select_one(&self, target: &AccountTarget, token: &str) -> Result<(), TesterError> {
        let response = self
            .client
            .post(format!("{}/queries/v1/query-request", target.base_url))
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .header(reqwest::header::AUTHORIZATION, format!("Snowflake Token=\"{}\"", token))
            .json(&json!({
                "sqlText": "SELECT 1",
                "asyncExec": false,
                "sequenceId": 1,
                "querySubmissionTime": chrono::Utc::now().timestamp_millis(),
            }))
            .send()
            .await?;

        Self::read_reply(response).await.map(|_| ())
    }

    /// Best effort; a failed logout does not fail the test
    async fn logout(&self, target: &AccountTarget, token: &str) {
        let result = self
            .client
            .post(format!("{}/session", target.base_url))
            .query(&[("delete", "true")])
            .header(reqwest::header::AUTHORIZATION, format!("Snowflake Token=\"{}\"", token))
            .send()
            .await;
        if let Err(e) = result {
            debug!("Snowflake logout failed: {}", e);
        }
    }

    async fn read_reply(response: reqwest::Response) -> Result<SnowflakeReply, TesterError> {
        if !response.status().is_success() {
            return Err(TesterError::Rejected { service: SERVICE, status: response.status().as_u16() });
        }
        let reply: SnowflakeReply = response.json().await?;
        if !reply.success {
            return Err(TesterError::UnexpectedResponse {
                service: SERVICE,
                reason: reply.message.unwrap_or_else(|| "success=false".to_string()),
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl ConnectionTester for SnowflakeTester {
    async fn probe(&self, credentials: &CredentialBundle) -> Result<(), TesterError> {
        let target = self.resolve_account(field(credentials, "accountUrl")?)?;
        let token = self.login(&target, credentials).await?;

        let result = self.select_one(&target, &token).await;
        self.logout(&target, &token).await;
        result
    }
}
