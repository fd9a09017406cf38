//! # Category Repository
//!
//! The category table is a small reference set written once, the first time
//! the crawler runs against an empty store, and read-only afterwards.

use catalog_core::CategoryRecord;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Returns true if no category has been stored yet.
    pub async fn is_empty(&self) -> DbResult<bool> {
        Ok(self.count().await? == 0)
    }

    /// Inserts all categories in one transaction. All or nothing.
    pub async fn insert_all(&self, categories: &[CategoryRecord]) -> DbResult<u64> {
        if categories.is_empty() {
            return Ok(0);
        }

        debug!(count = categories.len(), "Inserting categories");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut inserted = 0u64;
        for category in categories {
            let outcome = sqlx::query(
                "INSERT INTO categories (type_id, type_pid, type_name) VALUES (?1, ?2, ?3)",
            )
            .bind(category.type_id)
            .bind(category.type_pid)
            .bind(category.type_name.clone())
            .execute(&mut *tx)
            .await;

            match outcome {
                Ok(result) => inserted += result.rows_affected(),
                Err(e) => {
                    warn!(type_id = category.type_id, error = %e, "Category insert failed, rolling back");
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

    /// Lists all categories ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<CategoryRecord>> {
        let categories = sqlx::query_as::<_, CategoryRecord>(
            "SELECT type_id, type_pid, type_name FROM categories ORDER BY type_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Counts categories.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
