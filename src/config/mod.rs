use once_cell::sync::Lazy;
use std::env;
use std::fmt;

/// Client-exposed variable the dashboard once read the key from. Never used as key material.
const CLIENT_EXPOSED_KEY_VAR: &str = "NEXT_PUBLIC_SUPABASE_ENCRYPTION_KEY";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub testers: TesterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres URL. When unset in development the in-memory store is used.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub ensure_schema: bool,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub encryption_key: Option<String>,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TesterConfig {
    pub request_timeout_secs: u64,
    /// Base URL of the server hosting the `/api/test-*-connection` endpoints
    pub proxy_base_url: String,
    pub dropbox_api_url: String,
    pub google_token_url: String,
    pub google_drive_api_url: String,
    /// Overrides the regional AWS endpoint (path-style addressing is used when set)
    pub s3_endpoint: Option<String>,
    /// Overrides the account URL derived from `accountUrl`
    pub snowflake_base_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENSURE_SCHEMA") {
            self.database.ensure_schema = v.parse().unwrap_or(self.database.ensure_schema);
        }

        // API overrides
        if let Some(v) = env::var("DATAPORT_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("DATAPORT_ENCRYPTION_KEY") {
            self.security.encryption_key = Some(v);
        }
        if env::var_os(CLIENT_EXPOSED_KEY_VAR).is_some() {
            tracing::warn!(
                "{} is set but ignored: keys in client-exposed variables leak to browsers. Use DATAPORT_ENCRYPTION_KEY",
                CLIENT_EXPOSED_KEY_VAR
            );
        }
        if let Ok(v) = env::var("DATAPORT_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("DATAPORT_JWT_AUDIENCE") {
            self.security.jwt_audience = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Tester overrides
        if let Ok(v) = env::var("TESTER_REQUEST_TIMEOUT_SECS") {
            self.testers.request_timeout_secs = v.parse().unwrap_or(self.testers.request_timeout_secs);
        }
        if let Ok(v) = env::var("TESTER_PROXY_BASE_URL") {
            self.testers.proxy_base_url = v;
        }
        if let Ok(v) = env::var("TESTER_S3_ENDPOINT") {
            self.testers.s3_endpoint = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("TESTER_SNOWFLAKE_BASE_URL") {
            self.testers.snowflake_base_url = Some(v).filter(|s| !s.is_empty());
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                ensure_schema: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                encryption_key: None,
                jwt_secret: "dataport-development-jwt-secret".to_string(),
                jwt_audience: None,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            testers: TesterConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                ensure_schema: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                encryption_key: None,
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            testers: TesterConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                ensure_schema: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                encryption_key: None,
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            testers: TesterConfig {
                request_timeout_secs: 10,
                ..TesterConfig::default()
            },
        }
    }
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            proxy_base_url: "http://127.0.0.1:3000".to_string(),
            dropbox_api_url: "https://api.dropboxapi.com".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_drive_api_url: "https://www.googleapis.com/drive/v3".to_string(),
            s3_endpoint: None,
            snowflake_base_url: None,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .field("jwt_secret", &"<redacted>")
            .field("jwt_audience", &self.jwt_audience)
            .field("enable_cors", &self.enable_cors)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

// Global config - initialized once at startup by the binaries.
// Library types take their config sections explicitly.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
