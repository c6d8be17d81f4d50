// Server-side probes: POST /api/test-<source>-connection
//
// Body is the credential bundle. Replies `{ "success": true }` with 200, or
// `{ "success": false, "error": "..." }` with 500 when the probe fails.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::cipher::CredentialBundle;
use crate::state::AppState;
use crate::types::SourceType;

async fn probe(state: &AppState, source_type: SourceType, credentials: &CredentialBundle) -> (StatusCode, Json<Value>) {
    let Some(tester) = state.testers.get(source_type) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": format!("No tester for {}", source_type) })),
        );
    };

    match tester.probe(credentials).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => {
            tracing::warn!("Error testing {} connection: {}", source_type, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

pub async fn test_s3_connection(
    State(state): State<AppState>,
    Json(credentials): Json<CredentialBundle>,
) -> (StatusCode, Json<Value>) {
    probe(&state, SourceType::AwsS3, &credentials).await
}

pub async fn test_google_drive_connection(
    State(state): State<AppState>,
    Json(credentials): Json<CredentialBundle>,
) -> (StatusCode, Json<Value>) {
    probe(&state, SourceType::GoogleDrive, &credentials).await
}

pub async fn test_snowflake_connection(
    State(state): State<AppState>,
    Json(credentials): Json<CredentialBundle>,
) -> (StatusCode, Json<Value>) {
    probe(&state, SourceType::Snowflake, &credentials).await
}

pub async fn test_dropbox_connection(
    State(state): State<AppState>,
    Json(credentials): Json<CredentialBundle>,
) -> (StatusCode, Json<Value>) {
    probe(&state, SourceType::Dropbox, &credentials).await
}
