//! Upload ingestion: validation, reference resolution, persistence and
//! acknowledgement of file events.

mod error;
mod pipeline;
mod validate;

pub use error::IngestError;
pub use pipeline::{
    GENERIC_FAILURE, IngestSettings, Ingestor, UploadOutcome, UploadStage, display_name,
};
pub use validate::{ValidationError, validate};
