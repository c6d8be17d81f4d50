use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cipher::CredentialBundle;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::registry::{ConnectionRecord, UnreadableConnection};
use crate::state::AppState;
use crate::types::{SourceType, UnknownSourceType};

/// Body of `POST /api/connections` and `POST /api/connections/test`
#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub credentials: CredentialBundle,
}

impl ConnectionRequest {
    fn source_type(&self) -> Result<SourceType, ApiError> {
        self.source_type.parse().map_err(|e: UnknownSourceType| ApiError::bad_request(e.to_string()))
    }
}

/// Record as returned to clients: field names only, never secret values
#[derive(Debug, Serialize)]
pub struct ConnectionView {
    #[serde(flatten)]
    record: ConnectionRecord,
    fields: Vec<String>,
}

impl From<ConnectionRecord> for ConnectionView {
    fn from(record: ConnectionRecord) -> Self {
        let fields = record.credentials.field_names().map(str::to_string).collect();
        Self { record, fields }
    }
}

#[derive(Debug, Serialize)]
pub struct ConnectionList {
    pub connections: Vec<ConnectionView>,
    pub has_connections: bool,
    pub unreadable: Vec<UnreadableConnection>,
}

/// GET /api/connections
pub async fn list_connections(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<ConnectionList> {
    let mut registry = state.registry_for(user.user_id);
    registry.load().await?;

    Ok(ApiResponse::success(ConnectionList {
        connections: registry.connections().iter().cloned().map(ConnectionView::from).collect(),
        has_connections: registry.has_connections(),
        unreadable: registry.unreadable().to_vec(),
    }))
}

/// POST /api/connections
pub async fn create_connection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ConnectionRequest>,
) -> ApiResult<ConnectionView> {
    let source_type = request.source_type()?;
    let mut registry = state.registry_for(user.user_id);

    let record = registry.add(source_type, request.credentials).await?;
    Ok(ApiResponse::created(ConnectionView::from(record)))
}

/// DELETE /api/connections/:id
pub async fn delete_connection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let mut registry = state.registry_for(user.user_id);
    registry.remove(id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/connections/test
pub async fn test_connection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ConnectionRequest>,
) -> ApiResult<Value> {
    let source_type = request.source_type()?;
    let registry = state.registry_for(user.user_id);

    let success = registry.test(source_type, &request.credentials).await;
    Ok(ApiResponse::success(json!({ "success": success })))
}
