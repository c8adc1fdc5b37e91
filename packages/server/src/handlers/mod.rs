pub mod files;
pub mod health;
pub mod link;
pub mod webhook;

use std::error::Error;

use crate::error::AppError;
use crate::faults::{FaultContext, FaultOrigin};
use crate::state::AppState;

/// Report an unexpected failure and turn it into an opaque 500.
pub(crate) async fn report_internal(
    state: &AppState,
    operation: &'static str,
    err: &(dyn Error + Send + Sync),
) -> AppError {
    state
        .faults
        .report(err, &FaultContext::new(FaultOrigin::Http, operation))
        .await;
    AppError::Internal(format!("{operation}: {err}"))
}
