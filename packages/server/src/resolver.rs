use chrono::{DateTime, Utc};
use common::{Identifier, human_size};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::store::{FileStore, StoreError};

/// Public page for an identifier: `{base}/get?id={identifier}`.
pub fn resolver_link(public_base_url: &str, identifier: &Identifier) -> String {
    format!("{}/get?id={}", public_base_url.trim_end_matches('/'), identifier)
}

/// Everything a caller needs to present or fetch a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ResolvedReference {
    /// Public identifier.
    #[schema(value_type = String, example = "a1b2c3d4e5")]
    pub identifier: Identifier,
    /// Provider path of the binary.
    #[schema(example = "documents/file_42.pdf")]
    pub source_ref: String,
    #[schema(example = "report.pdf")]
    pub display_name: String,
    #[schema(example = 1048576)]
    pub size_bytes: u64,
    #[schema(example = "1.00 MB")]
    pub human_size: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedReference),
    NotFound,
}

/// Read-only lookup of identifiers for the HTTP surface.
#[derive(Clone)]
pub struct LinkResolver {
    store: FileStore,
}

impl LinkResolver {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// Malformed identifiers resolve to [`Resolution::NotFound`].
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw_identifier: &str) -> Result<Resolution, StoreError> {
        let Ok(identifier) = Identifier::parse(raw_identifier.trim()) else {
            debug!("Malformed identifier");
            return Ok(Resolution::NotFound);
        };

        let resolution = match self.store.find_by_identifier(&identifier).await? {
            Some(record) => Resolution::Found(ResolvedReference {
                human_size: human_size(record.size_bytes),
                identifier: record.identifier,
                source_ref: record.source_ref,
                display_name: record.display_name,
                size_bytes: record.size_bytes,
                created_at: record.created_at,
            }),
            None => Resolution::NotFound,
        };
        Ok(resolution)
    }
}
