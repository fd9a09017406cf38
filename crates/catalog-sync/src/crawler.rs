//! # Catalog Crawler
//!
//! Operator-driven crawls that sit beside incremental sync: seeding the
//! category table, re-pulling explicit page ranges, a full pass over every
//! page, and the insert-only listing crawl.
//!
//! ## Retry Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Per-Page Retry (crawls only)                        │
//! │                                                                         │
//! │  attempt 1 ──fail──► wait retry_delay_ms                               │
//! │  attempt 2 ──fail──► wait ×2 (capped at max_backoff_secs)              │
//! │  ...                                                                    │
//! │  attempt max_attempts ──fail──► page counted as failed, move on        │
//! │                                                                         │
//! │  Non-retryable errors (4xx, config) fail the page immediately.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Range crawls reconcile against the earliest representable time, so every
//! record on a crawled page is written: new ids inserted, known ids
//! overwritten, whatever their `vod_time`.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use catalog_core::coerce::{coerce_category, coerce_listing, wall_clock_now};
use catalog_db::Database;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::CrawlSettings;
use crate::error::{SyncError, SyncResult};
use crate::reconcile::Reconciler;
use crate::store::CatalogStore;
use crate::source::{ApiMode, CatalogPage, PageSource};
use crate::watermark::Watermark;

/// Tally of a page-range crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub succeeded: u32,
    pub failed: u32,
    pub inserted: usize,
    pub updated: usize,
}

/// Row counts and the current watermark.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub catalog_records: i64,
    pub categories: i64,
    pub listings: i64,
    pub watermark: NaiveDateTime,
}

/// Crawl driver over a [`PageSource`] and the SQLite store.
pub struct CatalogCrawler<P> {
    source: P,
    db: Database,
    settings: CrawlSettings,
}

impl<P: PageSource> CatalogCrawler<P> {
    pub fn new(source: P, db: Database, settings: CrawlSettings) -> Self {
        CatalogCrawler { source, db, settings }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.settings.retry_delay_ms),
            max_interval: Duration::from_secs(self.settings.max_backoff_secs),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Fetches a page, retrying retryable failures up to `max_attempts`.
    async fn fetch_with_retry(&self, mode: ApiMode, page: u32) -> SyncResult<CatalogPage> {
        let mut backoff = self.create_backoff();
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.source.fetch_page(mode, page).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| Duration::from_secs(self.settings.max_backoff_secs));
                    warn!(%mode, page, attempt, ?delay, error = %e, "Page fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Seeds the category table from list page 1.
    ///
    /// Does nothing if categories already exist.
    ///
    /// ## Returns
    /// Number of categories inserted.
    pub async fn seed_categories(&self) -> SyncResult<u64> {
        let categories = self.db.categories();
        if !categories.is_empty().await? {
            info!("Categories already present, skipping seed");
            return Ok(0);
        }

        let first = self.fetch_with_retry(ApiMode::List, 1).await?;
        let records: Vec<_> = first.categories.iter().map(coerce_category).collect();

        let inserted = categories.insert_all(&records).await?;
        info!(count = inserted, "Categories seeded");
        Ok(inserted)
    }

    /// Crawls detail pages `start..=end`, writing every record found.
    pub async fn crawl_range(&self, start: u32, end: u32) -> SyncResult<CrawlSummary> {
        if start == 0 || start > end {
            return Err(SyncError::InvalidConfig(format!(
                "invalid page range {start}..={end}"
            )));
        }

        info!(start, end, "Crawling detail pages");

        let catalog = self.db.catalog();
        let reconciler = Reconciler::new(&catalog);
        let mut summary = CrawlSummary::default();

        for page in start..=end {
            match self.fetch_with_retry(ApiMode::Detail, page).await {
                Ok(fetched) => apply_detail_page(&reconciler, page, &fetched, &mut summary).await,
                Err(e) => {
                    error!(page, error = %e, "Page failed after retries");
                    summary.failed += 1;
                }
            }
        }

        log_detail_summary(&summary);
        Ok(summary)
    }

    /// Discovers the detail page count and crawls every page.
    ///
    /// Page 1 is fetched once: it supplies the page count and is written
    /// before pages `2..=total` are crawled.
    pub async fn crawl_all(&self) -> SyncResult<CrawlSummary> {
        let first = self
            .fetch_with_retry(ApiMode::Detail, 1)
            .await
            .map_err(|e| SyncError::FirstPageUnavailable(e.to_string()))?;

        let total_pages = first.total_pages.ok_or_else(|| {
            SyncError::FirstPageUnavailable("missing or invalid total/limit".into())
        })?;

        if total_pages == 0 {
            info!("Remote catalog is empty");
            return Ok(CrawlSummary::default());
        }

        let catalog = self.db.catalog();
        let mut summary = CrawlSummary::default();
        apply_detail_page(&Reconciler::new(&catalog), 1, &first, &mut summary).await;

        if total_pages == 1 {
            log_detail_summary(&summary);
            return Ok(summary);
        }

        let rest = self.crawl_range(2, total_pages).await?;
        summary.succeeded += rest.succeeded;
        summary.failed += rest.failed;
        summary.inserted += rest.inserted;
        summary.updated += rest.updated;

        Ok(summary)
    }

    /// Crawls list pages `start..=end` into the listing table. Insert-only.
    pub async fn crawl_listing(&self, start: u32, end: u32) -> SyncResult<CrawlSummary> {
        if start == 0 || start > end {
            return Err(SyncError::InvalidConfig(format!(
                "invalid page range {start}..={end}"
            )));
        }

        info!(start, end, "Crawling listing pages");

        let listings = self.db.listings();
        let mut summary = CrawlSummary::default();

        for page in start..=end {
            let fetched = match self.fetch_with_retry(ApiMode::List, page).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    error!(page, error = %e, "Listing page failed after retries");
                    summary.failed += 1;
                    continue;
                }
            };

            let now = wall_clock_now();
            let rows: Vec<_> = fetched
                .records
                .iter()
                .map(|raw| coerce_listing(raw, now))
                .collect();

            match listings.insert_batch(&rows).await {
                Ok(inserted) => {
                    debug!(page, count = inserted, "Listing page stored");
                    summary.inserted += inserted as usize;
                    summary.succeeded += 1;
                }
                Err(e) => {
                    error!(page, error = %e, "Listing insert rolled back");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Row counts and the current watermark.
    pub async fn status(&self) -> SyncResult<StoreStatus> {
        let catalog = self.db.catalog();

        Ok(StoreStatus {
            catalog_records: catalog.count().await?,
            categories: self.db.categories().count().await?,
            listings: self.db.listings().count().await?,
            watermark: Watermark::new(&catalog).current().await?,
        })
    }
}

/// Writes one fetched detail page and folds its outcome into `summary`.
async fn apply_detail_page<S: CatalogStore + ?Sized>(
    reconciler: &Reconciler<'_, S>,
    page: u32,
    fetched: &CatalogPage,
    summary: &mut CrawlSummary,
) {
    let outcome = reconciler
        .reconcile(&fetched.records, NaiveDateTime::MIN)
        .instrument(info_span!("page", page))
        .await;

    summary.inserted += outcome.inserted;
    summary.updated += outcome.updated;
    if outcome.insert_failed {
        summary.failed += 1;
    } else {
        summary.succeeded += 1;
    }
}

fn log_detail_summary(summary: &CrawlSummary) {
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        inserted = summary.inserted,
        updated = summary.updated,
        "Detail crawl finished"
    );
}
