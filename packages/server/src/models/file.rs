use chrono::{DateTime, Utc};
use common::human_size;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::resolver::resolver_link;
use crate::store::FileRecord;

/// One entry of an owner listing.
#[derive(Serialize, ToSchema)]
pub struct FileSummary {
    #[schema(example = "a1b2c3d4e5")]
    pub identifier: String,
    #[schema(example = "report.pdf")]
    pub display_name: String,
    #[schema(example = 1048576)]
    pub size_bytes: u64,
    #[schema(example = "1.00 MB")]
    pub human_size: String,
    /// Public page for the file.
    #[schema(example = "https://files.example.com/get?id=a1b2c3d4e5")]
    pub link: String,
    pub created_at: DateTime<Utc>,
}

impl FileSummary {
    pub fn from_record(record: FileRecord, public_base_url: &str) -> Self {
        Self {
            link: resolver_link(public_base_url, &record.identifier),
            human_size: human_size(record.size_bytes),
            identifier: record.identifier.into_inner(),
            display_name: record.display_name,
            size_bytes: record.size_bytes,
            created_at: record.created_at,
        }
    }
}

/// Response DTO for an owner listing, most recent first.
#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub owner_id: i64,
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Maximum number of files to return. Default 20, capped at 100.
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LinkQuery {
    /// File identifier.
    pub id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}
