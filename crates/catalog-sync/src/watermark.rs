//! # Watermark
//!
//! Reads the caught-up cutoff from a [`CatalogStore`]. The arithmetic lives
//! in [`catalog_core::watermark`].

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::SyncResult;
use crate::store::CatalogStore;

/// Watermark reader over a store.
pub struct Watermark<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> Watermark<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Watermark { store }
    }

    /// Midnight of the newest stored `vod_time`, or the sentinel
    /// `2000-01-01 00:00:00` for an empty store.
    ///
    /// Store failures propagate: a run cannot proceed without a watermark.
    pub async fn current(&self) -> SyncResult<NaiveDateTime> {
        let latest = self.store.latest_vod_time().await?;
        let watermark = catalog_core::watermark::derive(latest);
        debug!(latest = ?latest, %watermark, "Watermark computed");
        Ok(watermark)
    }
}
