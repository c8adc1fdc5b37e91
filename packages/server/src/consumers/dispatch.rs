use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, instrument};
use transport::{EventPayload, InboundEvent};

use crate::commands::CommandHandler;
use crate::faults::{FaultContext, FaultOrigin, FaultReporter};
use crate::ingest::Ingestor;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("event {event_id} handler panicked: {message}")]
    Panicked { event_id: i64, message: String },
}

/// Routes inbound events to the ingestion pipeline or the command handler.
///
/// Shared by the polling consumer and the webhook endpoint.
#[derive(Clone)]
pub struct EventDispatcher {
    ingestor: Ingestor,
    commands: CommandHandler,
    faults: Arc<dyn FaultReporter>,
}

impl EventDispatcher {
    pub fn new(
        ingestor: Ingestor,
        commands: CommandHandler,
        faults: Arc<dyn FaultReporter>,
    ) -> Self {
        Self {
            ingestor,
            commands,
            faults,
        }
    }

    #[instrument(skip(self, event), fields(event_id = event.event_id, chat_id = event.chat_id))]
    pub async fn dispatch(&self, event: InboundEvent) {
        match event.payload {
            EventPayload::File(upload) => {
                self.ingestor
                    .ingest(event.chat_id, event.sender.id, upload)
                    .await;
            }
            EventPayload::Command(command) => {
                self.commands
                    .handle(event.chat_id, &event.sender, &command)
                    .await;
            }
            EventPayload::Text { .. } => self.commands.handle_text(event.chat_id).await,
            EventPayload::Unsupported => debug!("Ignoring event without file or text"),
        }
    }

    /// Like [`dispatch`](Self::dispatch), but a panicking handler is reported
    /// and turned into an error instead of unwinding into the caller.
    pub async fn dispatch_guarded(&self, event: InboundEvent) -> Result<(), DispatchError> {
        let event_id = event.event_id;
        let owner_id = event.sender.id;
        let chat_id = event.chat_id;

        match AssertUnwindSafe(self.dispatch(event)).catch_unwind().await {
            Ok(()) => Ok(()),
            Err(payload) => {
                let err = DispatchError::Panicked {
                    event_id,
                    message: panic_message(payload.as_ref()),
                };
                let context = FaultContext::new(FaultOrigin::Consumer, "dispatch")
                    .with_owner(owner_id)
                    .with_chat(chat_id);
                self.faults.report(&err, &context).await;
                Err(err)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
