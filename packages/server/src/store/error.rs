use std::time::Duration;

use common::Identifier;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("store operation `{op}` timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("identifier {0} is already taken")]
    IdentifierCollision(Identifier),

    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether a database error is a unique-key violation on insert.
    pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err, DbErr::RecordNotInserted)
            || matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }
}
