use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// How inbound events reach the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Long-poll `getUpdates` from a background task.
    #[default]
    Polling,
    /// Receive updates on `POST /webhook`.
    Webhook,
}

/// App-level transport configuration.
#[derive(Deserialize, Clone)]
pub struct TransportAppConfig {
    /// Bot API credential. Required.
    pub bot_token: String,
    #[serde(default)]
    pub mode: TransportMode,
    /// Bot API base URL. Default: "https://api.telegram.org".
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Timeout for ordinary API calls. Default: 10.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Long-poll duration passed to `getUpdates`. Default: 30.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Timeout for proxying file content. Default: 300.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Events processed concurrently by the consumer. Default: 4.
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header in webhook mode.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

fn default_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_poll_timeout_secs() -> u64 {
    30
}
fn default_download_timeout_secs() -> u64 {
    300
}
fn default_worker_concurrency() -> usize {
    4
}

impl TransportAppConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            mode: TransportMode::default(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            worker_concurrency: default_worker_concurrency(),
            webhook_secret: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

// The token is a credential; keep it out of logs.
impl fmt::Debug for TransportAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportAppConfig")
            .field("bot_token", &"<redacted>")
            .field("mode", &self.mode)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("worker_concurrency", &self.worker_concurrency)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
