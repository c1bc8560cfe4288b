//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use cdp_ledger_store::postgres::DEFAULT_MAX_CONNECTIONS;

/// Signing secret used when `JWT_SECRET` is not set. Development only.
const DEV_JWT_SECRET: &str = "cdp-ledger-dev-secret";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection string. `None` runs on the in-memory store.
    pub database_url: Option<String>,

    /// Maximum pooled database connections (default: 5).
    pub database_max_connections: u32,

    /// HS256 secret for signing access tokens.
    pub jwt_secret: String,

    /// Access token lifetime in minutes (default: 60).
    pub access_token_expire_minutes: i64,

    /// Emails granted the ledger operator role.
    pub ledger_operators: Vec<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Database secrets file structure.
#[derive(Debug, Deserialize)]
struct DatabaseSecrets {
    url: String,
    #[serde(default)]
    max_connections: Option<u32>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (database_url, file_max_connections) = load_database_secrets();

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set - using the development signing secret");
            DEV_JWT_SECRET.into()
        });

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .or(file_max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            jwt_secret,
            access_token_expire_minutes: env_parse("ACCESS_TOKEN_EXPIRE_MINUTES").unwrap_or(60),
            ledger_operators: split_list(&std::env::var("LEDGER_OPERATORS").unwrap_or_default()),
            cors_origins: split_list(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()),
            ),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS").unwrap_or(30),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Load database settings from file or environment.
fn load_database_secrets() -> (Option<String>, Option<u32>) {
    let secret_paths = [
        ".secrets/database.json",
        "cdp-ledger/.secrets/database.json",
        "../.secrets/database.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<DatabaseSecrets>(path) {
            tracing::info!(path = %path, "Loaded database secrets from file");
            return (Some(secrets.url), secrets.max_connections);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Database secrets file not found, using environment variables");
    (std::env::var("DATABASE_URL").ok(), None)
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<T, std::io::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            jwt_secret: DEV_JWT_SECRET.into(),
            access_token_expire_minutes: 60,
            ledger_operators: Vec::new(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
