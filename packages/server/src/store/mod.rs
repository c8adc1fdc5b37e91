//! Metadata store for uploaded files.
//!
//! All calls go through a shared connection pool and are bounded by a
//! per-call timeout, so the event consumer and HTTP handlers can use the same
//! [`FileStore`] concurrently.

mod error;
mod listing;

pub use error::StoreError;
pub use listing::OwnerListing;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::Identifier;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use tracing::{debug, instrument};

use crate::entity::file_record;

/// Metadata about one stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub identifier: Identifier,
    pub owner_id: i64,
    pub display_name: String,
    pub size_bytes: u64,
    /// Provider path of the binary; opaque outside the transport.
    pub source_ref: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<file_record::Model> for FileRecord {
    type Error = StoreError;

    fn try_from(model: file_record::Model) -> Result<Self, Self::Error> {
        let identifier = Identifier::parse(&model.identifier)
            .map_err(|e| StoreError::Corrupt(format!("row {}: {e}", model.id)))?;
        let size_bytes = u64::try_from(model.size_bytes)
            .map_err(|_| StoreError::Corrupt(format!("row {}: negative size", model.id)))?;
        Ok(Self {
            identifier,
            owner_id: model.owner_id,
            display_name: model.display_name,
            size_bytes,
            source_ref: model.source_ref,
            created_at: model.created_at,
        })
    }
}

/// Result of an owner-scoped delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// No record with that identifier belongs to the caller.
    NotFound,
}

#[derive(Clone)]
pub struct FileStore {
    db: DatabaseConnection,
    op_timeout: Duration,
}

impl FileStore {
    pub fn new(db: DatabaseConnection, op_timeout: Duration) -> Self {
        Self { db, op_timeout }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Run one database call under the per-call timeout.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout {
                op,
                after: self.op_timeout,
            }),
        }
    }

    /// Insert a record whose identifier must not exist yet.
    ///
    /// Fails with [`StoreError::IdentifierCollision`] when the identifier is
    /// taken; the existing row is left untouched.
    #[instrument(skip(self, record), fields(identifier = %record.identifier))]
    pub async fn insert_new(&self, record: &FileRecord) -> Result<(), StoreError> {
        let model = active_model(&record.identifier, record)?;
        let result = self
            .bounded(
                "insert_new",
                file_record::Entity::insert(model).exec_without_returning(&self.db),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(StoreError::Database(e)) if StoreError::is_unique_violation(&e) => {
                debug!("Identifier already taken");
                Err(StoreError::IdentifierCollision(record.identifier.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Create or fully replace the record stored under `identifier`.
    ///
    /// The creation time of an existing row is kept.
    #[instrument(skip(self, record), fields(identifier = %identifier))]
    pub async fn upsert_by_identifier(
        &self,
        identifier: &Identifier,
        record: &FileRecord,
    ) -> Result<(), StoreError> {
        let model = active_model(identifier, record)?;
        self.bounded(
            "upsert_by_identifier",
            file_record::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(file_record::Column::Identifier)
                        .update_columns([
                            file_record::Column::OwnerId,
                            file_record::Column::DisplayName,
                            file_record::Column::SizeBytes,
                            file_record::Column::SourceRef,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&self.db),
        )
        .await?;
        Ok(())
    }

    pub async fn find_by_identifier(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<FileRecord>, StoreError> {
        let model = self
            .bounded(
                "find_by_identifier",
                file_record::Entity::find()
                    .filter(file_record::Column::Identifier.eq(identifier.as_str()))
                    .one(&self.db),
            )
            .await?;

        model.map(FileRecord::try_from).transpose()
    }

    /// Lazily page through an owner's records, newest first, yielding at
    /// most `limit` of them.
    pub fn list_by_owner(&self, owner_id: i64, limit: u64) -> OwnerListing {
        OwnerListing::new(self.clone(), owner_id, limit)
    }

    /// Delete a record only if it belongs to `owner_id`.
    #[instrument(skip(self), fields(identifier = %identifier))]
    pub async fn delete_by_identifier_and_owner(
        &self,
        identifier: &Identifier,
        owner_id: i64,
    ) -> Result<DeleteOutcome, StoreError> {
        let result = self
            .bounded(
                "delete_by_identifier_and_owner",
                file_record::Entity::delete_many()
                    .filter(file_record::Column::Identifier.eq(identifier.as_str()))
                    .filter(file_record::Column::OwnerId.eq(owner_id))
                    .exec(&self.db),
            )
            .await?;

        if result.rows_affected > 0 {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

fn active_model(
    identifier: &Identifier,
    record: &FileRecord,
) -> Result<file_record::ActiveModel, StoreError> {
    let size_bytes = i64::try_from(record.size_bytes)
        .map_err(|_| StoreError::Corrupt(format!("size {} out of range", record.size_bytes)))?;
    Ok(file_record::ActiveModel {
        identifier: Set(identifier.as_str().to_string()),
        owner_id: Set(record.owner_id),
        display_name: Set(record.display_name.clone()),
        size_bytes: Set(size_bytes),
        source_ref: Set(record.source_ref.clone()),
        created_at: Set(record.created_at),
        ..Default::default()
    })
}
