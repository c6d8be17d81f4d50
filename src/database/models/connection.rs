use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{ConnectionStatus, SourceType};

/// Row of the `connections` table. `credentials` holds the envelope text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub source_type: String,
    pub name: String,
    pub credentials: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Values for a new row; id and created_at are assigned by the store
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub user_id: Uuid,
    pub source_type: SourceType,
    pub name: String,
    pub credentials: String,
    pub status: ConnectionStatus,
}
