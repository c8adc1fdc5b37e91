use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use tracing::instrument;

use super::report_internal;
use crate::error::AppError;
use crate::faults::{FaultContext, FaultOrigin};
use crate::models::file::LinkQuery;
use crate::resolver::Resolution;
use crate::state::AppState;
use crate::utils::filename::{content_disposition_value, content_type_for};
use crate::utils::html;

/// Public landing page behind a resolver link.
#[instrument(skip(state, query), fields(id = ?query.id))]
pub async fn file_page(State(state): State<AppState>, Query(query): Query<LinkQuery>) -> Response {
    let raw = query.id.unwrap_or_default();
    match state.resolver.resolve(&raw).await {
        Ok(Resolution::Found(reference)) => Html(html::file_page(
            &reference,
            state.config.upload.resolve_delay_seconds,
        ))
        .into_response(),
        Ok(Resolution::NotFound) => {
            (StatusCode::NOT_FOUND, Html(html::not_found_page())).into_response()
        }
        Err(e) => {
            let _ = report_internal(&state, "resolve", &e).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(html::error_page()),
            )
                .into_response()
        }
    }
}

/// Stream the stored binary from the transport.
///
/// The provider URL embeds the bot credential, so content is proxied rather
/// than redirected to.
#[instrument(skip(state, query), fields(id = ?query.id))]
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<LinkQuery>,
) -> Result<Response, AppError> {
    let raw = query.id.unwrap_or_default();
    let reference = match state.resolver.resolve(&raw).await {
        Ok(Resolution::Found(reference)) => reference,
        Ok(Resolution::NotFound) => {
            return Err(AppError::NotFound("File not found or expired".into()));
        }
        Err(e) => return Err(report_internal(&state, "resolve", &e).await),
    };

    let content = match state.transport.fetch_content(&reference.source_ref).await {
        Ok(content) => content,
        Err(e) => {
            state
                .faults
                .report(&e, &FaultContext::new(FaultOrigin::Http, "fetch_content"))
                .await;
            return Err(AppError::Upstream(e.to_string()));
        }
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            content_type_for(&reference.display_name),
        )
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&reference.display_name),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600");
    if let Some(length) = content.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length.to_string());
    }

    builder
        .body(Body::from_stream(content.stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
