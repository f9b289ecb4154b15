//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use starke_auth::AuthSettings;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Admin credentials and token policy.
    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where the SQLite file may live.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Durable directory next to the deployed application. Relative paths
    /// are taken from the working directory; an empty string means the
    /// deployment has no durable location.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Ephemeral directory that is always writable.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// How long a connection waits on a locked file.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Largest database image accepted by the restore route.
    #[serde(default = "default_max_backup_bytes")]
    pub max_backup_bytes: usize,
}

/// Cross-origin settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "starke_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_root_dir() -> String {
    ".".to_string()
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_file_name() -> String {
    starke_db::DEFAULT_FILE_NAME.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    10_000
}

fn default_max_backup_bytes() -> usize {
    crate::DEFAULT_MAX_BACKUP_BYTES
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            scratch_dir: default_scratch_dir(),
            file_name: default_file_name(),
            busy_timeout_ms: default_busy_timeout_ms(),
            max_backup_bytes: default_max_backup_bytes(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Token file path, defaulting to `tokens.json` in the scratch directory.
    pub fn token_file(&self) -> PathBuf {
        self.auth
            .token_file
            .clone()
            .unwrap_or_else(|| self.database.scratch_dir.join("tokens.json"))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// Environment variable overrides:
/// - `STARKE_HOST`, `STARKE_PORT` override `server.*`
/// - `STARKE_ROOT_DIR`, `STARKE_SCRATCH_DIR`, `STARKE_DB_FILE`,
///   `STARKE_MAX_BACKUP_BYTES` override `database.*`
/// - `STARKE_ADMIN_EMAIL`, `STARKE_ADMIN_PASSWORD` override the admin account
/// - `JWT_SECRET_KEY` overrides `auth.jwt_secret`
/// - `ALLOWED_ORIGINS` (comma-separated) overrides `cors.allowed_origins`
/// - `STARKE_LOG_LEVEL` overrides `logging.level`
/// - `STARKE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("STARKE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("STARKE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(root_dir) = var("STARKE_ROOT_DIR") {
        config.database.root_dir = root_dir;
    }
    if let Some(scratch_dir) = var("STARKE_SCRATCH_DIR") {
        config.database.scratch_dir = PathBuf::from(scratch_dir);
    }
    if let Some(file_name) = var("STARKE_DB_FILE") {
        config.database.file_name = file_name;
    }
    if let Some(max) = var("STARKE_MAX_BACKUP_BYTES") {
        if let Ok(parsed) = max.parse() {
            config.database.max_backup_bytes = parsed;
        }
    }
    if let Some(email) = var("STARKE_ADMIN_EMAIL") {
        config.auth.admin_email = email;
    }
    if let Some(password) = var("STARKE_ADMIN_PASSWORD") {
        config.auth.admin_password = password;
    }
    if let Some(secret) = var("JWT_SECRET_KEY") {
        config.auth.jwt_secret = secret;
    }
    if let Some(origins) = var("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(level) = var("STARKE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("STARKE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
