use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::JwtVerifier;
use crate::cipher::CredentialCipher;
use crate::config::{AppConfig, Environment};
use crate::database::{ConnectionStore, DatabaseManager, MemoryConnectionStore, PgConnectionStore};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;
use crate::testers::TesterSet;

/// Builds the full router for `state`
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(tester_routes())
        // Protected
        .merge(connection_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(config));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn tester_routes() -> Router<AppState> {
    Router::new()
        .route("/api/test-s3-connection", post(public::test_s3_connection))
        .route("/api/test-google-drive-connection", post(public::test_google_drive_connection))
        .route("/api/test-snowflake-connection", post(public::test_snowflake_connection))
        .route("/api/test-dropbox-connection", post(public::test_dropbox_connection))
}

fn connection_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/connections",
            get(protected::list_connections).post(protected::create_connection),
        )
        .route("/api/connections/test", post(protected::test_connection))
        .route("/api/connections/:id", delete(protected::delete_connection))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if config.environment == Environment::Development || origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Wires store, cipher, testers and token verifier from configuration
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let cipher = CredentialCipher::from_config(&config.security).context("credential cipher")?;
    let jwt = JwtVerifier::from_config(&config.security).context("session token verifier")?;
    let testers = TesterSet::direct(&config.testers).context("connection testers")?;

    let store: Arc<dyn ConnectionStore> = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await.context("database pool")?;
            Arc::new(PgConnectionStore::new(pool))
        }
        None if config.environment == Environment::Development => {
            warn!("DATABASE_URL not set; connections are kept in memory and lost on restart");
            Arc::new(MemoryConnectionStore::new())
        }
        None => anyhow::bail!("DATABASE_URL must be set in {:?}", config.environment),
    };

    Ok(AppState::new(store, cipher, testers, jwt))
}

/// Binds `config.api.port` and serves until the process is stopped
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let app = app(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Dataport API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_cipher, FlakyStore, StubTester};
    use crate::types::SourceType;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn state_with(store: Arc<FlakyStore>) -> AppState {
        let testers = TesterSet::new().with(SourceType::Dropbox, Arc::new(StubTester::new(true)));
        AppState::new(store, test_cipher(), testers, JwtVerifier::new("secret", None).unwrap())
    }

    #[tokio::test]
    async fn health_degrades_when_store_is_down() {
        let store = Arc::new(FlakyStore::new());
        let router = app(state_with(store.clone()), &AppConfig::development());

        let res = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        store.fail_reads(true);
        let res = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn store_outage_on_list_is_503() {
        let store = Arc::new(FlakyStore::new());
        store.fail_reads(true);
        let state = state_with(store);
        let token = state.jwt.issue(uuid::Uuid::new_v4(), chrono::Duration::minutes(5)).unwrap();
        let router = app(state, &AppConfig::development());

        let res = router
            .oneshot(
                Request::get("/api/connections")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn missing_database_url_is_fatal_outside_development() {
        let mut config = AppConfig::production();
        config.security.encryption_key = Some(CredentialCipher::generate_key());
        config.security.jwt_secret = "secret".to_string();
        assert!(build_state(&config).await.is_err());

        let mut config = AppConfig::development();
        config.security.encryption_key = Some(CredentialCipher::generate_key());
        assert!(build_state(&config).await.is_ok());
    }
}
