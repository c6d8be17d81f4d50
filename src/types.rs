/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External data providers a user can connect.
/// Used by the registry, the store rows and the tester dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "dropbox")]
    Dropbox,
    #[serde(rename = "google-drive")]
    GoogleDrive,
    #[serde(rename = "snowflake")]
    Snowflake,
    #[serde(rename = "aws-s3")]
    AwsS3,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [
        SourceType::Dropbox,
        SourceType::GoogleDrive,
        SourceType::Snowflake,
        SourceType::AwsS3,
    ];

    /// Identifier stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Dropbox => "dropbox",
            SourceType::GoogleDrive => "google-drive",
            SourceType::Snowflake => "snowflake",
            SourceType::AwsS3 => "aws-s3",
        }
    }

    /// Name given to new connections of this type
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceType::Dropbox => "Dropbox",
            SourceType::GoogleDrive => "Google Drive",
            SourceType::Snowflake => "Snowflake",
            SourceType::AwsS3 => "AWS S3",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SourceType::Dropbox => "Connect your Dropbox account to import files and folders",
            SourceType::GoogleDrive => "Access and import files from your Google Drive",
            SourceType::Snowflake => "Connect to your Snowflake data warehouse",
            SourceType::AwsS3 => "Import data from your S3 buckets",
        }
    }

    /// Credential fields a bundle must carry for this source type
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            SourceType::Dropbox => &["accessToken"],
            SourceType::GoogleDrive => &["clientId", "clientSecret", "refreshToken"],
            SourceType::Snowflake => &["accountUrl", "username", "password", "warehouse", "database"],
            SourceType::AwsS3 => &["accessKeyId", "secretAccessKey", "region", "bucket"],
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported connection type: {0}")]
pub struct UnknownSourceType(pub String);

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSourceType(s.to_string()))
    }
}

/// Lifecycle state of a stored connection.
/// `Error` is only ever written by an external sync process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected" => Ok(ConnectionStatus::Connected),
            "disconnected" => Ok(ConnectionStatus::Disconnected),
            "error" => Ok(ConnectionStatus::Error),
            other => Err(format!("unknown connection status '{}'", other)),
        }
    }
}
