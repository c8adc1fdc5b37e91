use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::{FileRecord, FileStore, StoreError};
use crate::entity::file_record;

const DEFAULT_PAGE_SIZE: u64 = 50;

/// Finite, restartable cursor over one owner's records, most recent first.
///
/// Nothing is fetched until [`next_batch`](Self::next_batch) is called.
pub struct OwnerListing {
    store: FileStore,
    owner_id: i64,
    limit: u64,
    page_size: u64,
    yielded: u64,
    exhausted: bool,
}

impl OwnerListing {
    pub(super) fn new(store: FileStore, owner_id: i64, limit: u64) -> Self {
        Self {
            store,
            owner_id,
            limit,
            page_size: DEFAULT_PAGE_SIZE,
            yielded: 0,
            exhausted: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// Fetch the next page. `Ok(None)` once the limit is reached or the
    /// owner has no more records.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<FileRecord>>, StoreError> {
        if self.exhausted || self.yielded >= self.limit {
            return Ok(None);
        }

        let take = (self.limit - self.yielded).min(self.page_size);
        let models = self
            .store
            .bounded(
                "list_by_owner",
                file_record::Entity::find()
                    .filter(file_record::Column::OwnerId.eq(self.owner_id))
                    .order_by_desc(file_record::Column::CreatedAt)
                    .order_by_desc(file_record::Column::Id)
                    .offset(Some(self.yielded))
                    .limit(Some(take))
                    .all(self.store.connection()),
            )
            .await?;

        let fetched = models.len() as u64;
        if fetched < take {
            self.exhausted = true;
        }
        if fetched == 0 {
            return Ok(None);
        }
        self.yielded += fetched;

        models
            .into_iter()
            .map(FileRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Rewind to the newest record.
    pub fn restart(&mut self) {
        self.yielded = 0;
        self.exhausted = false;
    }

    /// Drain the remaining pages.
    pub async fn collect(mut self) -> Result<Vec<FileRecord>, StoreError> {
        let mut records = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            records.extend(batch);
        }
        Ok(records)
    }
}
