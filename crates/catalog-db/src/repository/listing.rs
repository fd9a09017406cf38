//! # Listing Repository
//!
//! Listing rows are appended page by page. There is no uniqueness on
//! `vod_id`: crawling the same page twice stores the rows twice.

use catalog_core::ListingRecord;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Repository for listing operations.
#[derive(Debug, Clone)]
pub struct ListingRepository {
    pool: SqlitePool,
}

impl ListingRepository {
    /// Creates a new ListingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ListingRepository { pool }
    }

    /// Appends a page of listing rows in one transaction.
    pub async fn insert_batch(&self, listings: &[ListingRecord]) -> DbResult<u64> {
        if listings.is_empty() {
            return Ok(0);
        }

        debug!(count = listings.len(), "Inserting listing batch");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut inserted = 0u64;
        for listing in listings {
            let outcome = sqlx::query(
                r#"
                INSERT INTO listing_records (
                    vod_id, type_id, type_name, vod_name, vod_en,
                    vod_remarks, vod_play_from, vod_time, vod_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(listing.vod_id)
            .bind(listing.type_id)
            .bind(listing.type_name.clone())
            .bind(listing.vod_name.clone())
            .bind(listing.vod_en.clone())
            .bind(listing.vod_remarks.clone())
            .bind(listing.vod_play_from.clone())
            .bind(listing.vod_time)
            .bind(listing.vod_total)
            .execute(&mut *tx)
            .await;

            match outcome {
                Ok(result) => inserted += result.rows_affected(),
                Err(e) => {
                    warn!(vod_id = listing.vod_id, error = %e, "Listing insert failed, rolling back");
                    tx.rollback()
                        .await
                        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                    return Err(e.into());
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(inserted)
    }

    /// Lists rows stored for one `vod_id`, oldest first.
    pub async fn list_by_vod_id(&self, vod_id: i64) -> DbResult<Vec<ListingRecord>> {
        let rows = sqlx::query_as::<_, ListingRecord>(
            r#"
            SELECT vod_id, type_id, type_name, vod_name, vod_en,
                   vod_remarks, vod_play_from, vod_time, vod_total
            FROM listing_records
            WHERE vod_id = ?1
            ORDER BY id
            "#,
        )
        .bind(vod_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Counts listing rows.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listing_records")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn listing(vod_id: i64) -> ListingRecord {
        ListingRecord {
            vod_id,
            type_id: 1,
            type_name: Some("Movies".into()),
            vod_name: Some("Title".into()),
            vod_en: None,
            vod_remarks: Some("HD".into()),
            vod_play_from: None,
            vod_time: None,
            vod_total: 3,
        }
    }

    #[tokio::test]
    async fn test_duplicates_are_appended() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().listings();

        repo.insert_batch(&[listing(1), listing(2)]).await.unwrap();
        repo.insert_batch(&[listing(1)]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.list_by_vod_id(1).await.unwrap(), vec![listing(1), listing(1)]);
    }
}
