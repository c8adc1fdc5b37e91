use std::sync::Arc;

use common::IdGenerator;
use sea_orm::DatabaseConnection;
use transport::Transport;

use crate::commands::{CommandHandler, CommandSettings};
use crate::config::AppConfig;
use crate::consumers::EventDispatcher;
use crate::faults::FaultReporter;
use crate::ingest::{IngestSettings, Ingestor};
use crate::resolver::LinkResolver;
use crate::store::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: FileStore,
    pub resolver: LinkResolver,
    pub transport: Arc<dyn Transport>,
    pub faults: Arc<dyn FaultReporter>,
    pub dispatcher: EventDispatcher,
}

impl AppState {
    /// Wire the process-scoped components together.
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        transport: Arc<dyn Transport>,
        faults: Arc<dyn FaultReporter>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let store = FileStore::new(db, config.database.op_timeout());
        let ingestor = Ingestor::new(
            store.clone(),
            transport.clone(),
            faults.clone(),
            ids,
            IngestSettings::from_config(&config),
        );
        let commands = CommandHandler::new(
            store.clone(),
            transport.clone(),
            faults.clone(),
            CommandSettings::from_config(&config),
        );
        let dispatcher = EventDispatcher::new(ingestor, commands, faults.clone());

        Self {
            config: Arc::new(config),
            resolver: LinkResolver::new(store.clone()),
            store,
            transport,
            faults,
            dispatcher,
        }
    }
}
