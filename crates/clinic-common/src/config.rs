//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use serde::Deserialize;

/// Load the application configuration from the environment.
///
/// Called once by the binary at startup; the resulting value is handed to the
/// API state rather than stored globally.
pub fn load() -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = with_defaults(config::Config::builder())?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (CLINIC__SERVER__HOST, CLINIC__DATABASE__URL, etc.)
        .add_source(
            config::Environment::with_prefix("CLINIC")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    cfg.try_deserialize()
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite://clinic.db?mode=rwc")?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 1)?
        .set_default("auth.access_token_ttl_secs", 900)? // 15 min
        .set_default("storage.endpoint", "")?
        .set_default("storage.bucket", "clinic")?
        .set_default("storage.access_key", "")?
        .set_default("storage.secret_key", "")?
        .set_default("storage.region", "us-east-1")?
        .set_default("storage.data_dir", "./data/uploads")?
        .set_default("storage.delete_attempts", 3)?
        .set_default("limits.max_image_bytes", 2_097_152)? // 2048 KiB
        .set_default("limits.max_body_bytes", 10_485_760) // 10 MiB
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL. `postgres://…` in production, `sqlite://…` in lite mode.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret (HS256): should be 256+ bits of entropy
    pub jwt_secret: String,
    /// Access token TTL in seconds
    pub access_token_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// S3 endpoint URL (e.g., http://localhost:9000 for MinIO).
    /// Leave empty / unset in lite mode: files go to `data_dir` instead.
    pub endpoint: String,
    pub bucket: String,
    /// Static credentials. When empty the AWS default credential chain is used.
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base URL that object keys are appended to when building public links.
    /// Defaults to `{endpoint}/{bucket}` (S3) or `http://{host}:{port}/files` (lite).
    pub public_url: Option<String>,
    /// Local directory for file storage in lite mode (default: ./data/uploads).
    pub data_dir: String,
    /// How many times an object delete is tried before the request fails.
    pub delete_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_image_bytes: usize,
    pub max_body_bytes: usize,
}

impl StorageConfig {
    /// Lite mode stores objects on the local filesystem.
    pub fn is_lite(&self) -> bool {
        self.endpoint.trim().is_empty()
    }
}
