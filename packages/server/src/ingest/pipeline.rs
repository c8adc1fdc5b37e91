use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use common::retry::RetryPolicy;
use common::{IdGenerator, human_size};
use tracing::{Instrument, debug, info, instrument, warn};
use transport::{FileUpload, Transport, TransportError};

use super::error::IngestError;
use super::validate::{ValidationError, validate};
use crate::config::AppConfig;
use crate::faults::{FaultContext, FaultOrigin, FaultReporter};
use crate::resolver::resolver_link;
use crate::store::{FileRecord, FileStore, StoreError};

/// Reply sent when an accepted upload could not be completed.
pub const GENERIC_FAILURE: &str =
    "❌ Something went wrong while saving your file. Please try again later.";

/// Progress of one upload through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Validated,
    ReferenceResolved,
    Persisted,
    Acknowledged,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::ReferenceResolved => "reference_resolved",
            Self::Persisted => "persisted",
            Self::Acknowledged => "acknowledged",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Persisted and acknowledged with the resolver link.
    Stored { record: FileRecord, link: String },
    /// Refused by validation; the uploader was told why.
    Rejected(ValidationError),
    /// Accepted but not completed. `stage` is the last stage reached.
    Failed { stage: UploadStage },
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub max_upload_bytes: u64,
    pub public_base_url: String,
    pub max_identifier_attempts: u8,
    /// Bound for one content reference lookup.
    pub reference_timeout: Duration,
    pub reference_retry: RetryPolicy,
}

impl IngestSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_upload_bytes: config.upload.max_bytes,
            public_base_url: config.server.public_base_url.clone(),
            max_identifier_attempts: config.upload.max_identifier_attempts,
            reference_timeout: config.transport.request_timeout(),
            reference_retry: RetryPolicy::once(config.upload.reference_retry_delay_ms),
        }
    }
}

/// Name shown for a stored file: the uploaded name, else the last segment of
/// the provider path, else `"file"`.
pub fn display_name(file_name: Option<&str>, source_ref: &str) -> String {
    if let Some(name) = file_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match source_ref.rsplit('/').next().map(str::trim) {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => "file".to_string(),
    }
}

/// Drives file events from validation to acknowledgement.
///
/// Cheap to clone; every clone shares the same store pool and transport.
#[derive(Clone)]
pub struct Ingestor {
    store: FileStore,
    transport: Arc<dyn Transport>,
    faults: Arc<dyn FaultReporter>,
    ids: Arc<dyn IdGenerator>,
    settings: IngestSettings,
}

impl Ingestor {
    pub fn new(
        store: FileStore,
        transport: Arc<dyn Transport>,
        faults: Arc<dyn FaultReporter>,
        ids: Arc<dyn IdGenerator>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            store,
            transport,
            faults,
            ids,
            settings,
        }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Process one file event end to end.
    ///
    /// Once the content reference is resolved, persistence and the reply run
    /// in a detached task; dropping the returned future does not cancel them.
    #[instrument(skip(self, upload), fields(kind = %upload.kind))]
    pub async fn ingest(&self, chat_id: i64, owner_id: i64, upload: FileUpload) -> UploadOutcome {
        debug!(stage = %UploadStage::Received, "Upload received");

        // A missing size is treated as 0.
        let size_bytes = upload.size_bytes.unwrap_or(0);
        if let Err(rejection) = validate(&upload.kind, size_bytes, self.settings.max_upload_bytes) {
            info!(reason = %rejection, "Upload rejected");
            self.reply(chat_id, &rejection.user_message()).await;
            return UploadOutcome::Rejected(rejection);
        }
        debug!(stage = %UploadStage::Validated, size_bytes, "Upload validated");

        let source_ref = match self.resolve_reference(&upload.content_ref).await {
            Ok(source_ref) => source_ref,
            Err(e) => {
                self.fail(chat_id, owner_id, "resolve_reference", IngestError::Transport(e))
                    .await;
                return UploadOutcome::Failed {
                    stage: UploadStage::Validated,
                };
            }
        };
        debug!(stage = %UploadStage::ReferenceResolved, "Content reference resolved");

        let name = display_name(upload.file_name.as_deref(), &source_ref);
        let this = self.clone();
        let task = tokio::spawn(
            async move {
                this.persist_and_acknowledge(chat_id, owner_id, name, size_bytes, source_ref)
                    .await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail(chat_id, owner_id, "persist", IngestError::Aborted(e))
                    .await;
                UploadOutcome::Failed {
                    stage: UploadStage::ReferenceResolved,
                }
            }
        }
    }

    /// Resolve with a bounded timeout and at most the configured retries.
    async fn resolve_reference(&self, content_ref: &str) -> Result<String, TransportError> {
        let policy = self.settings.reference_retry;
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let result = tokio::time::timeout(
                self.settings.reference_timeout,
                self.transport.resolve_content_reference(content_ref),
            )
            .await
            .unwrap_or(Err(TransportError::Timeout));

            match result {
                Ok(source_ref) => return Ok(source_ref),
                Err(e) if e.is_retryable() && attempt < policy.total_attempts() => {
                    let delay = policy.delay(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Content reference lookup failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn persist_and_acknowledge(
        self,
        chat_id: i64,
        owner_id: i64,
        display_name: String,
        size_bytes: u64,
        source_ref: String,
    ) -> UploadOutcome {
        // Microsecond precision survives every supported backend unchanged.
        let created_at = Utc::now().trunc_subsecs(6);
        let max_attempts = self.settings.max_identifier_attempts.max(1);

        let mut attempts: u8 = 0;
        let record = loop {
            attempts += 1;
            let record = FileRecord {
                identifier: self.ids.generate(),
                owner_id,
                display_name: display_name.clone(),
                size_bytes,
                source_ref: source_ref.clone(),
                created_at,
            };

            match self.store.insert_new(&record).await {
                Ok(()) => break record,
                Err(StoreError::IdentifierCollision(taken)) if attempts < max_attempts => {
                    debug!(identifier = %taken, attempts, "Identifier collision, regenerating");
                }
                Err(StoreError::IdentifierCollision(_)) => {
                    self.fail(
                        chat_id,
                        owner_id,
                        "persist",
                        IngestError::StorageExhausted { attempts },
                    )
                    .await;
                    return UploadOutcome::Failed {
                        stage: UploadStage::ReferenceResolved,
                    };
                }
                Err(e) => {
                    self.fail(chat_id, owner_id, "persist", IngestError::Storage(e))
                        .await;
                    return UploadOutcome::Failed {
                        stage: UploadStage::ReferenceResolved,
                    };
                }
            }
        };
        debug!(stage = %UploadStage::Persisted, identifier = %record.identifier, "Upload persisted");

        let link = resolver_link(&self.settings.public_base_url, &record.identifier);
        let text = format!(
            "✅ File saved!\n\n📄 Name: {}\n📦 Size: {}\n🆔 ID: {}\n🔗 Link: {}",
            record.display_name,
            human_size(record.size_bytes),
            record.identifier,
            link
        );
        self.reply(chat_id, &text).await;

        info!(
            stage = %UploadStage::Acknowledged,
            identifier = %record.identifier,
            owner_id,
            size_bytes,
            "Upload stored"
        );
        UploadOutcome::Stored { record, link }
    }

    async fn fail(&self, chat_id: i64, owner_id: i64, operation: &'static str, err: IngestError) {
        let context = FaultContext::new(FaultOrigin::Ingestion, operation)
            .with_owner(owner_id)
            .with_chat(chat_id);
        self.faults.report(&err, &context).await;
        self.reply(chat_id, GENERIC_FAILURE).await;
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_message(chat_id, text).await {
            warn!(chat_id, error = %e, "Failed to deliver reply");
        }
    }
}
