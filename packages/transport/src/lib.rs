pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod telegram;

pub use config::{TransportAppConfig, TransportMode};
pub use error::TransportError;
pub use models::{
    Command, ContentStream, EventPayload, FetchedContent, FileUpload, InboundEvent, PolledBatch,
    Sender, Transport,
};
pub use poller::UpdatePoller;
pub use telegram::TelegramClient;
