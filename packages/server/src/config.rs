use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use transport::TransportAppConfig;

/// Environment variable naming an alternative config file (without extension).
pub const CONFIG_PATH_ENV: &str = "FILELINK_CONFIG";

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: 3600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL used to build resolver links.
    pub public_base_url: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Mount `GET /api/v1/owners/{owner_id}/files`.
    #[serde(default)]
    pub public_listing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Upper bound for a single store call.
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}
fn default_op_timeout_secs() -> u64 {
    5
}

impl DatabaseConfig {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Largest accepted upload, inclusive.
    pub max_bytes: u64,
    /// Seconds the link page holds back the download link. 0 disables the gate.
    #[serde(default)]
    pub resolve_delay_seconds: u64,
    #[serde(default = "default_max_identifier_attempts")]
    pub max_identifier_attempts: u8,
    /// Pause before retrying a failed content reference lookup.
    #[serde(default = "default_reference_retry_delay_ms")]
    pub reference_retry_delay_ms: u64,
}

fn default_max_identifier_attempts() -> u8 {
    5
}
fn default_reference_retry_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FaultConfig {
    /// Chat that receives diagnostics. Unset means log-only reporting.
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
    #[serde(default = "default_report_timeout_secs")]
    pub report_timeout_secs: u64,
}

fn default_report_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    /// Maximum entries returned by `/files`.
    #[serde(default = "default_list_limit")]
    pub list_limit: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

fn default_list_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub transport: TransportAppConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub faults: FaultConfig,
    #[serde(default)]
    pub commands: CommandConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config".into());
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // Load from config/config.toml
            .add_source(File::with_name(&path).required(false))
            // Override from environment (e.g., FILELINK__TRANSPORT__BOT_TOKEN)
            .add_source(Environment::with_prefix("FILELINK").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that deserialize but cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("transport.bot_token", self.transport.bot_token.trim()),
            ("database.url", self.database.url.trim()),
            ("server.public_base_url", self.server.public_base_url.trim()),
        ];
        for (key, value) in required {
            if value.is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Message(
                "upload.max_bytes must be greater than zero".into(),
            ));
        }
        if self.upload.max_identifier_attempts == 0 {
            return Err(ConfigError::Message(
                "upload.max_identifier_attempts must be at least 1".into(),
            ));
        }
        if self.transport.worker_concurrency == 0 {
            return Err(ConfigError::Message(
                "transport.worker_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
