use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::{field, ConnectionTester, TesterError};
use crate::cipher::CredentialBundle;

const SERVICE: &str = "AWS S3";

/// SHA-256 of an empty payload
const EMPTY_PAYLOAD_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";
const LIST_QUERY: &str = "list-type=2&max-keys=1";

type HmacSha256 = Hmac<Sha256>;

/// Lists at most one object in the bucket with a SigV4-signed request
pub struct S3Tester {
    client: reqwest::Client,
    endpoint: Option<String>,
}

/// Headers produced by signing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub host: String,
    pub amz_date: String,
    pub authorization: String,
}

impl S3Tester {
    /// `endpoint` switches to path-style addressing against a custom host
    pub fn new(client: reqwest::Client, endpoint: Option<String>) -> Self {
        Self { client, endpoint }
    }

    /// Signs `GET ?list-type=2&max-keys=1` for the bucket
    pub fn sign_list_objects(
        &self,
        access_key_id: &str,
        secret_access_key: &str,
        region: &str,
        bucket: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest, TesterError> {
        validate_bucket(bucket)?;
        validate_region(region)?;

        let (base, canonical_uri) = match &self.endpoint {
            Some(endpoint) => (
                format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
                format!("/{}", bucket),
            ),
            None => (format!("https://{}.s3.{}.amazonaws.com/", bucket, region), "/".to_string()),
        };

        let parsed = url::Url::parse(&base).map_err(|e| TesterError::Config(format!("invalid S3 URL: {}", e)))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(TesterError::Config("S3 URL has no host".to_string())),
        };

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", date_stamp, region);

        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            canonical_uri, LIST_QUERY, host, EMPTY_PAYLOAD_SHA256, amz_date, SIGNED_HEADERS, EMPTY_PAYLOAD_SHA256
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{:x}",
            amz_date,
            scope,
            Sha256::digest(canonical_request.as_bytes())
        );

        let k_date = hmac(format!("AWS4{}", secret_access_key).as_bytes(), date_stamp.as_bytes())?;
        let k_region = hmac(&k_date, region.as_bytes())?;
        let k_service = hmac(&k_region, b"s3")?;
        let k_signing = hmac(&k_service, b"aws4_request")?;
        let signature = hex(&hmac(&k_signing, string_to_sign.as_bytes())?);

        Ok(SignedRequest {
            url: format!("{}?{}", base, LIST_QUERY),
            host,
            amz_date,
            authorization: format!(
                "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
                access_key_id, scope, SIGNED_HEADERS, signature
            ),
        })
    }
}

/// S3 bucket naming rules: 3-63 of `[a-z0-9.-]`, alphanumeric at both ends
fn validate_bucket(bucket: &str) -> Result<(), TesterError> {
    let valid = (3..=63).contains(&bucket.len())
        && bucket.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
        && bucket.starts_with(|c: char| c.is_ascii_alphanumeric())
        && bucket.ends_with(|c: char| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(TesterError::Config(format!("invalid S3 bucket name '{}'", bucket)))
    }
}

fn validate_region(region: &str) -> Result<(), TesterError> {
    let valid = !region.is_empty()
        && region.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(TesterError::Config(format!("invalid AWS region '{}'", region)))
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, TesterError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| TesterError::Config(format!("invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl ConnectionTester for S3Tester {
    async fn probe(&self, credentials: &CredentialBundle) -> Result<(), TesterError> {
        let signed = self.sign_list_objects(
            field(credentials, "accessKeyId")?,
            field(credentials, "secretAccessKey")?,
            field(credentials, "region")?,
            field(credentials, "bucket")?,
            Utc::now(),
        )?;

        let response = self
            .client
            .get(&signed.url)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
            .header(reqwest::header::AUTHORIZATION, &signed.authorization)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TesterError::Rejected { service: SERVICE, status: response.status().as_u16() });
        }
        Ok(())
    }
}
