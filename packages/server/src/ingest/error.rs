use thiserror::Error;
use tokio::task::JoinError;
use transport::TransportError;

use crate::store::StoreError;

/// Failure of an accepted upload, handed to the fault reporter.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("content reference could not be resolved: {0}")]
    Transport(#[from] TransportError),

    #[error("upload could not be persisted: {0}")]
    Storage(#[from] StoreError),

    #[error("no free identifier after {attempts} attempts")]
    StorageExhausted { attempts: u8 },

    #[error("upload task did not finish: {0}")]
    Aborted(#[from] JoinError),
}
