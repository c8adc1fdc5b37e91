use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use common::ContentKind;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// A unit of work delivered by the messaging transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transport-assigned sequence number.
    pub event_id: i64,
    /// Conversation to reply into.
    pub chat_id: i64,
    pub sender: Sender,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    File(FileUpload),
    Command(Command),
    Text { text: String },
    /// Anything without a file or text (service messages, locations, ...).
    Unsupported,
}

/// A file attached to an inbound event, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUpload {
    pub kind: ContentKind,
    /// Opaque handle the transport resolves into a durable source reference.
    pub content_ref: String,
    pub size_bytes: Option<u64>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Lowercase command name without the leading slash or bot mention.
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Parse `/name@bot arg1 arg2`. Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_ascii_lowercase(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

/// One `poll_events` round.
#[derive(Debug, Clone, Default)]
pub struct PolledBatch {
    pub events: Vec<InboundEvent>,
    /// Offset acknowledging everything in this batch, including updates that
    /// did not convert into events.
    pub next_offset: Option<i64>,
}

pub type ContentStream = BoxStream<'static, Result<Bytes, TransportError>>;

pub struct FetchedContent {
    pub content_length: Option<u64>,
    pub stream: ContentStream,
}

/// Messaging transport consumed by the ingestion pipeline and the HTTP surface.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for events after `offset`.
    async fn poll_events(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<PolledBatch, TransportError>;

    /// Decode one pushed update (webhook mode). `Ok(None)` for updates that
    /// carry no event.
    fn decode_push(&self, body: &[u8]) -> Result<Option<InboundEvent>, TransportError>;

    /// Resolve a content reference into a durable source reference.
    async fn resolve_content_reference(&self, content_ref: &str) -> Result<String, TransportError>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Open the binary behind a source reference.
    async fn fetch_content(&self, source_ref: &str) -> Result<FetchedContent, TransportError>;

    /// Drop any registered push endpoint so polling does not conflict with it.
    async fn delete_webhook(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
