//! Reporting of unexpected failures.
//!
//! Reporters never fail and never propagate: a broken diagnostics channel must
//! not take the request or event that triggered it down with it.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};
use transport::Transport;

/// Where a fault was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOrigin {
    Ingestion,
    Command,
    Http,
    Consumer,
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ingestion => "ingestion",
            Self::Command => "command",
            Self::Http => "http",
            Self::Consumer => "consumer",
        })
    }
}

#[derive(Debug, Clone)]
pub struct FaultContext {
    pub origin: FaultOrigin,
    /// Short name of the failed operation, e.g. `"persist"`.
    pub operation: &'static str,
    pub owner_id: Option<i64>,
    pub chat_id: Option<i64>,
}

impl FaultContext {
    pub fn new(origin: FaultOrigin, operation: &'static str) -> Self {
        Self {
            origin,
            operation,
            owner_id: None,
            chat_id: None,
        }
    }

    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }
}

#[async_trait]
pub trait FaultReporter: Send + Sync {
    async fn report(&self, error: &(dyn Error + Send + Sync), context: &FaultContext);
}

/// Render an error with its source chain, skipping sources whose text the
/// outer message already contains.
pub fn error_chain(error: &(dyn Error + Send + Sync)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// Writes faults to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

#[async_trait]
impl FaultReporter for LogReporter {
    async fn report(&self, err: &(dyn Error + Send + Sync), context: &FaultContext) {
        error!(
            origin = %context.origin,
            operation = context.operation,
            owner_id = ?context.owner_id,
            chat_id = ?context.chat_id,
            error = %error_chain(err),
            "Unexpected failure"
        );
    }
}

/// Logs locally and forwards a diagnostic to an operator chat.
pub struct ChatReporter {
    transport: Arc<dyn Transport>,
    admin_chat_id: i64,
    timeout: Duration,
}

impl ChatReporter {
    pub fn new(transport: Arc<dyn Transport>, admin_chat_id: i64, timeout: Duration) -> Self {
        Self {
            transport,
            admin_chat_id,
            timeout,
        }
    }
}

#[async_trait]
impl FaultReporter for ChatReporter {
    async fn report(&self, err: &(dyn Error + Send + Sync), context: &FaultContext) {
        LogReporter.report(err, context).await;

        let mut text = format!(
            "Fault in {} ({})\n{}",
            context.origin,
            context.operation,
            error_chain(err)
        );
        if let Some(owner_id) = context.owner_id {
            text.push_str(&format!("\nowner: {owner_id}"));
        }

        let delivery = tokio::time::timeout(
            self.timeout,
            self.transport.send_message(self.admin_chat_id, &text),
        )
        .await;
        match delivery {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to deliver fault report"),
            Err(_) => warn!(timeout = ?self.timeout, "Fault report delivery timed out"),
        }
    }
}

/// Pick the reporter for the configured admin chat.
pub fn reporter_for(
    transport: Arc<dyn Transport>,
    admin_chat_id: Option<i64>,
    timeout: Duration,
) -> Arc<dyn FaultReporter> {
    match admin_chat_id {
        Some(chat_id) => Arc::new(ChatReporter::new(transport, chat_id, timeout)),
        None => Arc::new(LogReporter),
    }
}
