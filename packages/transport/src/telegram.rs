//! Telegram Bot API client.
//!
//! Only the handful of methods the registry needs: `getUpdates`, `getFile`,
//! `sendMessage`, `deleteWebhook`, and the file download endpoint.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use common::ContentKind;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::TransportAppConfig;
use crate::error::TransportError;
use crate::models::{
    Command, EventPayload, FetchedContent, FileUpload, InboundEvent, PolledBatch, Sender,
    Transport,
};

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(config: &TransportAppConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            request_timeout: config.request_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    async fn call<P, T>(&self, method: &str, params: &P, timeout: Duration) -> Result<T, TransportError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        decode_envelope(status, &body)
    }
}

/// Decode a Bot API reply. Proxies in front of the API answer throttling and
/// outages with non-JSON bodies; those keep their HTTP status so they stay
/// retryable.
fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<T, TransportError> {
    match serde_json::from_slice::<ApiResponse<T>>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(_) if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            Err(TransportError::Api {
                code: i64::from(status.as_u16()),
                description: status.canonical_reason().unwrap_or("HTTP error").to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Transport for TelegramClient {
    #[instrument(skip(self))]
    async fn poll_events(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<PolledBatch, TransportError> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self
            .call("getUpdates", &params, timeout + self.request_timeout)
            .await?;

        let next_offset = updates.iter().map(|u| u.update_id + 1).max();
        let events: Vec<InboundEvent> = updates.into_iter().filter_map(Update::into_event).collect();
        debug!(count = events.len(), ?next_offset, "Polled updates");

        Ok(PolledBatch {
            events,
            next_offset,
        })
    }

    fn decode_push(&self, body: &[u8]) -> Result<Option<InboundEvent>, TransportError> {
        parse_update(body)
    }

    #[instrument(skip(self))]
    async fn resolve_content_reference(&self, content_ref: &str) -> Result<String, TransportError> {
        let file: TgFileInfo = self
            .call(
                "getFile",
                &serde_json::json!({ "file_id": content_ref }),
                self.request_timeout,
            )
            .await?;

        file.file_path.filter(|p| !p.is_empty()).ok_or_else(|| {
            TransportError::Decode(format!("getFile returned no file_path for {content_ref}"))
        })
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat_id, "text": text }),
                self.request_timeout,
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_content(&self, source_ref: &str) -> Result<FetchedContent, TransportError> {
        let response = self
            .http
            .get(self.file_url(source_ref))
            .timeout(self.download_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "File download rejected");
            return Err(TransportError::Api {
                code: status.as_u16() as i64,
                description: status.canonical_reason().unwrap_or("download failed").into(),
            });
        }

        let content_length = response.content_length();
        let stream = response.bytes_stream().map_err(TransportError::from);
        Ok(FetchedContent {
            content_length,
            stream: Box::pin(stream),
        })
    }

    async fn delete_webhook(&self) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &serde_json::json!({ "drop_pending_updates": false }),
                self.request_timeout,
            )
            .await?;
        Ok(())
    }
}

/// Decode a single pushed update.
pub fn parse_update(body: &[u8]) -> Result<Option<InboundEvent>, TransportError> {
    let update: Update = serde_json::from_slice(body)?;
    Ok(update.into_event())
}

// ---------------------------------------------------------------------------
// Bot API wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TransportError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(TransportError::Decode("response has no result".into())),
            (false, _) => Err(TransportError::Api {
                code: self.error_code.unwrap_or(0),
                description: self.description.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Serialize)]
struct GetUpdatesParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Deserialize)]
struct TgFileInfo {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
    document: Option<TgFile>,
    video: Option<TgFile>,
    audio: Option<TgFile>,
    photo: Option<Vec<TgFile>>,
    voice: Option<TgFile>,
    video_note: Option<TgFile>,
    animation: Option<TgFile>,
    sticker: Option<TgFile>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    first_name: String,
}

#[derive(Debug, Deserialize)]
struct TgFile {
    file_id: String,
    file_name: Option<String>,
    file_size: Option<u64>,
}

impl TgFile {
    fn into_upload(self, kind: ContentKind) -> FileUpload {
        FileUpload {
            kind,
            content_ref: self.file_id,
            size_bytes: self.file_size,
            file_name: self.file_name.filter(|n| !n.trim().is_empty()),
        }
    }
}

impl Update {
    fn into_event(self) -> Option<InboundEvent> {
        let message = self.message?;
        let sender = match &message.from {
            Some(user) => Sender {
                id: user.id,
                display_name: user.first_name.clone(),
            },
            None => Sender {
                id: message.chat.id,
                display_name: String::new(),
            },
        };
        let chat_id = message.chat.id;

        Some(InboundEvent {
            event_id: self.update_id,
            chat_id,
            sender,
            payload: message.into_payload(),
        })
    }
}

impl TgMessage {
    fn into_payload(self) -> EventPayload {
        if let Some(file) = self.document {
            return EventPayload::File(file.into_upload(ContentKind::Document));
        }
        if let Some(file) = self.video {
            return EventPayload::File(file.into_upload(ContentKind::Video));
        }
        if let Some(file) = self.audio {
            return EventPayload::File(file.into_upload(ContentKind::Audio));
        }
        // Photos arrive as several resolutions; keep the largest.
        if let Some(file) = self
            .photo
            .and_then(|sizes| sizes.into_iter().max_by_key(|p| p.file_size.unwrap_or(0)))
        {
            return EventPayload::File(file.into_upload(ContentKind::Image));
        }

        let other = [
            ("voice", self.voice),
            ("video_note", self.video_note),
            ("animation", self.animation),
            ("sticker", self.sticker),
        ];
        for (kind, file) in other {
            if let Some(file) = file {
                return EventPayload::File(file.into_upload(ContentKind::Other(kind.into())));
            }
        }

        match self.text {
            Some(text) => match Command::parse(&text) {
                Some(command) => EventPayload::Command(command),
                None => EventPayload::Text { text },
            },
            None => EventPayload::Unsupported,
        }
    }
}
