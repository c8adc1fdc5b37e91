//! Text commands sent to the bot.

use std::fmt::Write as _;
use std::sync::Arc;

use common::{Identifier, human_size};
use tracing::{info, instrument, warn};
use transport::{Command, Sender, Transport};

use crate::config::AppConfig;
use crate::faults::{FaultContext, FaultOrigin, FaultReporter};
use crate::resolver::resolver_link;
use crate::store::{DeleteOutcome, FileStore, StoreError};

const COMMAND_FAILURE: &str = "❌ Something went wrong. Please try again later.";
const TEXT_HINT: &str =
    "📎 Send me a document, video, audio file or photo and I'll give you a link to it. Type /help for commands.";
const UNKNOWN_COMMAND: &str = "🤔 Unknown command. Type /help to see what I can do.";

#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub list_limit: u64,
    pub max_upload_bytes: u64,
    pub public_base_url: String,
}

impl CommandSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            list_limit: config.commands.list_limit,
            max_upload_bytes: config.upload.max_bytes,
            public_base_url: config.server.public_base_url.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CommandHandler {
    store: FileStore,
    transport: Arc<dyn Transport>,
    faults: Arc<dyn FaultReporter>,
    settings: CommandSettings,
}

impl CommandHandler {
    pub fn new(
        store: FileStore,
        transport: Arc<dyn Transport>,
        faults: Arc<dyn FaultReporter>,
        settings: CommandSettings,
    ) -> Self {
        Self {
            store,
            transport,
            faults,
            settings,
        }
    }

    /// Run a command and send the reply into `chat_id`.
    #[instrument(skip(self, sender, command), fields(owner_id = sender.id, command = %command.name))]
    pub async fn handle(&self, chat_id: i64, sender: &Sender, command: &Command) {
        let text = self.respond(chat_id, sender, command).await;
        self.send(chat_id, &text).await;
    }

    /// Answer plain text that is not a command.
    pub async fn handle_text(&self, chat_id: i64) {
        self.send(chat_id, TEXT_HINT).await;
    }

    /// Reply text for a command, without sending it.
    pub async fn respond(&self, chat_id: i64, sender: &Sender, command: &Command) -> String {
        match command.name.as_str() {
            "start" | "help" => self.welcome(sender),
            "files" => match self.list_files(sender.id).await {
                Ok(text) => text,
                Err(e) => self.failure(e, "list_files", chat_id, sender.id).await,
            },
            "delete" => match command.args.first() {
                None => "Usage: /delete <id>".to_string(),
                Some(raw) => match self.delete(sender.id, raw).await {
                    Ok(text) => text,
                    Err(e) => self.failure(e, "delete", chat_id, sender.id).await,
                },
            },
            _ => UNKNOWN_COMMAND.to_string(),
        }
    }

    fn welcome(&self, sender: &Sender) -> String {
        format!(
            "{}\n\n\
             Welcome to the File Bot.\n\
             You can upload files (docs, videos, audio, photos) up to {} here.\n\
             After each upload you get a short link to download it.\n\n\
             /files - list your uploads\n\
             /delete <id> - remove one of your uploads",
            greeting(&sender.display_name),
            human_size(self.settings.max_upload_bytes)
        )
    }

    async fn list_files(&self, owner_id: i64) -> Result<String, StoreError> {
        let records = self
            .store
            .list_by_owner(owner_id, self.settings.list_limit)
            .collect()
            .await?;

        if records.is_empty() {
            return Ok("📭 You have not uploaded any files yet.".to_string());
        }

        let mut text = format!("📂 Your latest {} file(s):\n", records.len());
        for record in &records {
            let _ = write!(
                text,
                "\n• {} ({})\n  {}",
                record.display_name,
                human_size(record.size_bytes),
                resolver_link(&self.settings.public_base_url, &record.identifier)
            );
        }
        Ok(text)
    }

    async fn delete(&self, owner_id: i64, raw: &str) -> Result<String, StoreError> {
        let not_found = format!("🔍 No file with ID {raw} belongs to you.");
        let Ok(identifier) = Identifier::parse(raw) else {
            return Ok(not_found);
        };

        match self
            .store
            .delete_by_identifier_and_owner(&identifier, owner_id)
            .await?
        {
            DeleteOutcome::Deleted => {
                info!(identifier = %identifier, owner_id, "File deleted by owner");
                Ok(format!("🗑 Deleted {identifier}."))
            }
            DeleteOutcome::NotFound => Ok(not_found),
        }
    }

    async fn failure(
        &self,
        err: StoreError,
        operation: &'static str,
        chat_id: i64,
        owner_id: i64,
    ) -> String {
        let context = FaultContext::new(FaultOrigin::Command, operation)
            .with_owner(owner_id)
            .with_chat(chat_id);
        self.faults.report(&err, &context).await;
        COMMAND_FAILURE.to_string()
    }

    async fn send(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_message(chat_id, text).await {
            warn!(chat_id, error = %e, "Failed to deliver reply");
        }
    }
}

/// Greeting line; senders without a usable name get a neutral one.
fn greeting(display_name: &str) -> String {
    match display_name.trim() {
        "" => "👋 Hello!".to_string(),
        name => format!("👋 Hello {name}!"),
    }
}
