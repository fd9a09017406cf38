//! # Catalog Store
//!
//! The slice of persistence the reconciler needs, as a trait so the engine
//! can run against SQLite in production and an in-memory map in tests.

use async_trait::async_trait;
use catalog_core::CatalogRecord;
use catalog_db::CatalogRepository;
use chrono::NaiveDateTime;

use crate::error::SyncResult;

/// Keyed catalog storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Newest `vod_time` stored, `None` when empty.
    async fn latest_vod_time(&self) -> SyncResult<Option<NaiveDateTime>>;

    /// Looks up a record by external id.
    async fn find_by_vod_id(&self, vod_id: i64) -> SyncResult<Option<CatalogRecord>>;

    /// Overwrites every field of an existing record.
    async fn update(&self, record: &CatalogRecord) -> SyncResult<()>;

    /// Inserts records atomically. On error nothing is kept.
    async fn insert_batch(&self, records: &[CatalogRecord]) -> SyncResult<u64>;
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    async fn latest_vod_time(&self) -> SyncResult<Option<NaiveDateTime>> {
        Ok(CatalogRepository::latest_vod_time(self).await?)
    }

    async fn find_by_vod_id(&self, vod_id: i64) -> SyncResult<Option<CatalogRecord>> {
        Ok(self.get_by_vod_id(vod_id).await?)
    }

    async fn update(&self, record: &CatalogRecord) -> SyncResult<()> {
        Ok(CatalogRepository::update(self, record).await?)
    }

    async fn insert_batch(&self, records: &[CatalogRecord]) -> SyncResult<u64> {
        Ok(CatalogRepository::insert_batch(self, records).await?)
    }
}
