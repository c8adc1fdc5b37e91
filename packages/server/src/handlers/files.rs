use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use super::report_internal;
use crate::error::{AppError, ErrorBody};
use crate::models::file::{FileListResponse, FileSummary, ListQuery};
use crate::resolver::{Resolution, ResolvedReference};
use crate::state::AppState;

const MAX_LIST_LIMIT: u64 = 100;
const DEFAULT_LIST_LIMIT: u64 = 20;

#[utoipa::path(
    get,
    path = "/files/{identifier}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Resolve a file identifier",
    description = "Returns the stored reference for an identifier. Malformed and unknown \
        identifiers both yield 404.",
    params(("identifier" = String, Path, description = "10-character file identifier")),
    responses(
        (status = 200, description = "Stored reference", body = ResolvedReference),
        (status = 404, description = "Unknown identifier (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ResolvedReference>, AppError> {
    match state.resolver.resolve(&identifier).await {
        Ok(Resolution::Found(reference)) => Ok(Json(reference)),
        Ok(Resolution::NotFound) => Err(AppError::NotFound("File not found or expired".into())),
        Err(e) => Err(report_internal(&state, "resolve", &e).await),
    }
}

#[utoipa::path(
    get,
    path = "/owners/{owner_id}/files",
    tag = "Files",
    operation_id = "listOwnerFiles",
    summary = "List an owner's files",
    description = "Most recent first. Only mounted when `server.public_listing` is enabled.",
    params(
        ("owner_id" = i64, Path, description = "Transport user ID"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Owner listing", body = FileListResponse),
        (status = 400, description = "Invalid limit (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_owner_files(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 || limit > MAX_LIST_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }

    let records = match state.store.list_by_owner(owner_id, limit).collect().await {
        Ok(records) => records,
        Err(e) => return Err(report_internal(&state, "list_by_owner", &e).await),
    };

    let base = &state.config.server.public_base_url;
    Ok(Json(FileListResponse {
        owner_id,
        files: records
            .into_iter()
            .map(|record| FileSummary::from_record(record, base))
            .collect(),
    }))
}
