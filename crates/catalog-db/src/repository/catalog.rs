//! # Catalog Repository
//!
//! Database operations for detail records (`catalog_records`).
//!
//! ## Write Granularity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     How Records Reach the Store                         │
//! │                                                                         │
//! │  update(record)          insert_batch(records)                         │
//! │  ──────────────          ─────────────────────                         │
//! │  One statement,          BEGIN                                          │
//! │  autocommitted.            INSERT ... (record 1)                        │
//! │                            INSERT ... (record 2)                        │
//! │                            ...                                          │
//! │                          COMMIT   ← any failure: ROLLBACK, nothing kept │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use catalog_core::CatalogRecord;
use chrono::NaiveDateTime;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Column list shared by every statement. Order matches [`bind_record`].
const CATALOG_COLUMNS: &str = "vod_id, type_id, type_name, vod_name, vod_sub, vod_en, vod_pic, \
     vod_actor, vod_director, vod_area, vod_lang, vod_remarks, vod_content, vod_class, \
     vod_score, vod_play_from, vod_play_url, vod_time, vod_year, vod_hits, vod_hits_day, \
     vod_hits_week, vod_hits_month, vod_total, vod_score_num";

const INSERT_SQL: &str = r#"
    INSERT INTO catalog_records (
        vod_id, type_id, type_name, vod_name, vod_sub, vod_en, vod_pic,
        vod_actor, vod_director, vod_area, vod_lang, vod_remarks, vod_content, vod_class,
        vod_score, vod_play_from, vod_play_url, vod_time, vod_year, vod_hits, vod_hits_day,
        vod_hits_week, vod_hits_month, vod_total, vod_score_num
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7,
        ?8, ?9, ?10, ?11, ?12, ?13, ?14,
        ?15, ?16, ?17, ?18, ?19, ?20, ?21,
        ?22, ?23, ?24, ?25
    )
"#;

const UPDATE_SQL: &str = r#"
    UPDATE catalog_records SET
        type_id = ?2,
        type_name = ?3,
        vod_name = ?4,
        vod_sub = ?5,
        vod_en = ?6,
        vod_pic = ?7,
        vod_actor = ?8,
        vod_director = ?9,
        vod_area = ?10,
        vod_lang = ?11,
        vod_remarks = ?12,
        vod_content = ?13,
        vod_class = ?14,
        vod_score = ?15,
        vod_play_from = ?16,
        vod_play_url = ?17,
        vod_time = ?18,
        vod_year = ?19,
        vod_hits = ?20,
        vod_hits_day = ?21,
        vod_hits_week = ?22,
        vod_hits_month = ?23,
        vod_total = ?24,
        vod_score_num = ?25
    WHERE vod_id = ?1
"#;

type SqliteQuery = Query<'static, Sqlite, SqliteArguments<'static>>;

/// Binds every column of a record as `?1..?25`.
fn bind_record(query: SqliteQuery, record: &CatalogRecord) -> SqliteQuery {
    query
        .bind(record.vod_id)
        .bind(record.type_id)
        .bind(record.type_name.clone())
        .bind(record.vod_name.clone())
        .bind(record.vod_sub.clone())
        .bind(record.vod_en.clone())
        .bind(record.vod_pic.clone())
        .bind(record.vod_actor.clone())
        .bind(record.vod_director.clone())
        .bind(record.vod_area.clone())
        .bind(record.vod_lang.clone())
        .bind(record.vod_remarks.clone())
        .bind(record.vod_content.clone())
        .bind(record.vod_class.clone())
        .bind(record.vod_score.clone())
        .bind(record.vod_play_from.clone())
        .bind(record.vod_play_url.clone())
        .bind(record.vod_time)
        .bind(record.vod_year)
        .bind(record.vod_hits)
        .bind(record.vod_hits_day)
        .bind(record.vod_hits_week)
        .bind(record.vod_hits_month)
        .bind(record.vod_total)
        .bind(record.vod_score_num)
}

/// Repository for catalog record operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Returns the newest `vod_time` in the table, or `None` when empty.
    pub async fn latest_vod_time(&self) -> DbResult<Option<NaiveDateTime>> {
        let latest: Option<NaiveDateTime> =
            sqlx::query_scalar("SELECT MAX(vod_time) FROM catalog_records")
                .fetch_one(&self.pool)
                .await?;

        Ok(latest)
    }

    /// Gets a record by its external id.
    ///
    /// ## Returns
    /// * `Ok(Some(CatalogRecord))` - Record found
    /// * `Ok(None)` - No record with this `vod_id`
    pub async fn get_by_vod_id(&self, vod_id: i64) -> DbResult<Option<CatalogRecord>> {
        let sql = format!("SELECT {CATALOG_COLUMNS} FROM catalog_records WHERE vod_id = ?1");

        let record = sqlx::query_as::<_, CatalogRecord>(&sql)
            .bind(vod_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Replaces every field of an existing record.
    ///
    /// ## Returns
    /// * `Ok(())` - Update committed
    /// * `Err(DbError::NotFound)` - No record with this `vod_id`
    pub async fn update(&self, record: &CatalogRecord) -> DbResult<()> {
        debug!(vod_id = record.vod_id, "Updating catalog record");

        let result = bind_record(sqlx::query(UPDATE_SQL), record)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CatalogRecord", record.vod_id));
        }

        Ok(())
    }

    /// Inserts new records in a single transaction.
    ///
    /// All or nothing: if any row fails the transaction is rolled back and
    /// the error is returned.
    ///
    /// ## Returns
    /// Number of rows inserted.
    pub async fn insert_batch(&self, records: &[CatalogRecord]) -> DbResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        debug!(count = records.len(), "Inserting catalog batch");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut inserted = 0u64;
        for record in records {
            let outcome = bind_record(sqlx::query(INSERT_SQL), record)
                .execute(&mut *tx)
                .await;

            match outcome {
                Ok(result) => inserted += result.rows_affected(),
                Err(e) => {
                    warn!(vod_id = record.vod_id, error = %e, "Batch insert failed, rolling back");
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

    /// Counts catalog records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_records")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
