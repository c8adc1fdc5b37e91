use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::state::AppState;

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Receive one pushed update and run it through the dispatcher.
///
/// Answers 200 once the event is handled, whatever happened to the upload
/// itself; only undecodable or crashed updates get a 500.
#[instrument(skip_all)]
pub async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(expected) = state.config.transport.webhook_secret.as_deref() {
        let presented = headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            warn!("Rejected webhook call with a missing or wrong secret");
            return Err(AppError::Unauthorized);
        }
    }

    let event = match state.transport.decode_push(&body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("Update carries no event");
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            warn!(error = %e, "Failed to decode pushed update");
            return Err(AppError::Internal(format!("decode update: {e}")));
        }
    };

    state
        .dispatcher
        .dispatch_guarded(event)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(StatusCode::OK)
}
