use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("transport request timed out")]
    Timeout,

    #[error("transport API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("failed to decode transport payload: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_decode() {
            return Self::Decode(err.without_url().to_string());
        }
        // Request URLs embed the bot credential.
        Self::Http(err.without_url())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
