//! # Sync Scheduler
//!
//! Drives one incremental sync run over detail pages.
//!
//! ## Run State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          One Sync Run                                   │
//! │                                                                         │
//! │  watermark = Watermark::current()          (once per run)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch page 1 ──fail / no page count──► Err(FirstPageUnavailable)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────┐  reconcile, stop=false, page < N                         │
//! │  │ Scanning │◄──────────────────────────────┐                          │
//! │  └────┬─────┘                               │                          │
//! │       │ fetch page+1 (failure: log, skip)   │                          │
//! │       └─────────────────────────────────────┘                          │
//! │       │                                                                 │
//! │       ├── stop=true ─────► Stopped(CaughtUp)                           │
//! │       └── page == N ─────► Stopped(Exhausted)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are processed strictly in sequence; a page finishes reconciling
//! before the next request is sent.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::source::{ApiMode, PageSource};
use crate::store::CatalogStore;
use crate::watermark::Watermark;

// =============================================================================
// Scan State
// =============================================================================

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page's last record was already covered by the watermark.
    CaughtUp,
    /// Every page up to the page count was visited.
    Exhausted,
}

/// Traversal state. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Stopped(StopReason),
}

impl ScanState {
    /// State after `page` of `total_pages` has been handled.
    pub fn after_page(page: u32, total_pages: u32, stop: bool) -> Self {
        if stop {
            ScanState::Stopped(StopReason::CaughtUp)
        } else if page >= total_pages {
            ScanState::Stopped(StopReason::Exhausted)
        } else {
            ScanState::Scanning
        }
    }
}

// =============================================================================
// Sync Report
// =============================================================================

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub watermark: NaiveDateTime,
    pub total_pages: u32,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub update_failed: usize,
    pub failed_insert_batches: u32,
    pub stop_reason: StopReason,
}

impl SyncReport {
    fn absorb(&mut self, outcome: &ReconcileOutcome) {
        self.pages_fetched += 1;
        self.inserted += outcome.inserted;
        self.updated += outcome.updated;
        self.skipped += outcome.skipped;
        self.update_failed += outcome.update_failed;
        if outcome.insert_failed {
            self.failed_insert_batches += 1;
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Incremental sync over a [`PageSource`] and a [`CatalogStore`].
pub struct SyncScheduler<P, S> {
    source: P,
    store: S,
}

impl<P: PageSource, S: CatalogStore> SyncScheduler<P, S> {
    pub fn new(source: P, store: S) -> Self {
        SyncScheduler { source, store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one incremental sync.
    ///
    /// ## Returns
    /// * `Ok(SyncReport)` - Run finished, possibly with skipped pages
    /// * `Err(SyncError::FirstPageUnavailable)` - Page 1 failed or had no page count
    /// * `Err(SyncError::DatabaseError)` - Watermark could not be read
    pub async fn run(&self) -> SyncResult<SyncReport> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id)
            .instrument(info_span!("sync_run", %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid) -> SyncResult<SyncReport> {
        let watermark = Watermark::new(&self.store).current().await?;
        info!(%watermark, "Sync run started");

        let reconciler = Reconciler::new(&self.store);

        let first = match self.source.fetch_page(ApiMode::Detail, 1).await {
            Ok(page) => page,
            Err(e) => {
                error!(page = 1, error = %e, "First page fetch failed, aborting run");
                return Err(SyncError::FirstPageUnavailable(e.to_string()));
            }
        };

        let total_pages = match first.total_pages {
            Some(total) => total,
            None => {
                error!(page = 1, "First page carried no usable page count, aborting run");
                return Err(SyncError::FirstPageUnavailable(
                    "missing or invalid total/limit".into(),
                ));
            }
        };
        info!(total_pages, "Page count fixed for this run");

        let mut report = SyncReport {
            run_id,
            watermark,
            total_pages,
            pages_fetched: 0,
            pages_failed: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            update_failed: 0,
            failed_insert_batches: 0,
            stop_reason: StopReason::Exhausted,
        };

        let outcome = reconciler
            .reconcile(&first.records, watermark)
            .instrument(info_span!("page", page = 1))
            .await;
        report.absorb(&outcome);

        let mut page = 1;
        let mut state = ScanState::after_page(page, total_pages, outcome.stop);

        while state == ScanState::Scanning {
            page += 1;

            let stop = match self.source.fetch_page(ApiMode::Detail, page).await {
                Ok(fetched) => {
                    let outcome = reconciler
                        .reconcile(&fetched.records, watermark)
                        .instrument(info_span!("page", page))
                        .await;
                    report.absorb(&outcome);
                    outcome.stop
                }
                Err(e) => {
                    warn!(page, error = %e, "Page fetch failed, skipping");
                    report.pages_failed += 1;
                    false
                }
            };

            state = ScanState::after_page(page, total_pages, stop);
        }

        if let ScanState::Stopped(reason) = state {
            report.stop_reason = reason;
        }

        info!(
            pages_fetched = report.pages_fetched,
            pages_failed = report.pages_failed,
            inserted = report.inserted,
            updated = report.updated,
            stop_reason = ?report.stop_reason,
            "Sync run finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detail_record, page, raw_record, ts, MemoryStore, ScriptedSource};

    fn three_page_source() -> ScriptedSource {
        ScriptedSource::default()
            .with_page(
                ApiMode::Detail,
                1,
                page(vec![raw_record(1, "2024-06-03 10:00:00"), raw_record(2, "2024-06-03 09:00:00")], Some(3)),
            )
            .with_page(
                ApiMode::Detail,
                2,
                page(vec![raw_record(3, "2024-06-02 10:00:00"), raw_record(4, "2024-06-02 09:00:00")], Some(3)),
            )
            .with_page(
                ApiMode::Detail,
                3,
                page(vec![raw_record(5, "2024-06-01 10:00:00"), raw_record(6, "2024-05-31 09:00:00")], Some(3)),
            )
    }

    #[test]
    fn test_scan_state_transitions() {
        assert_eq!(ScanState::after_page(1, 3, false), ScanState::Scanning);
        assert_eq!(ScanState::after_page(1, 3, true), ScanState::Stopped(StopReason::CaughtUp));
        assert_eq!(ScanState::after_page(3, 3, false), ScanState::Stopped(StopReason::Exhausted));
        assert_eq!(ScanState::after_page(1, 0, false), ScanState::Stopped(StopReason::Exhausted));
    }

    #[tokio::test]
    async fn test_empty_store_walks_every_page() {
        let source = three_page_source();
        let scheduler = SyncScheduler::new(source.clone(), MemoryStore::default());

        let report = scheduler.run().await.unwrap();

        assert_eq!(report.watermark, ts("2000-01-01 00:00:00"));
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.inserted, 6);
        assert_eq!(report.stop_reason, StopReason::Exhausted);
        assert_eq!(source.requested_pages(ApiMode::Detail), vec![1, 2, 3]);
        assert_eq!(scheduler.store().len(), 6);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let source = three_page_source();
        let scheduler = SyncScheduler::new(source, MemoryStore::default());

        scheduler.run().await.unwrap();
        let after_first = scheduler.store().snapshot();

        let report = scheduler.run().await.unwrap();
        let after_second = scheduler.store().snapshot();

        assert_eq!(after_first.len(), after_second.len());
        assert_eq!(report.inserted, 0);
        // Watermark is 2024-06-03 00:00; page 1 holds records from that day.
        assert_eq!(report.updated, 2);
        assert_eq!(report.stop_reason, StopReason::CaughtUp);
        assert_eq!(report.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_stops_once_caught_up() {
        let store = MemoryStore::with_records(vec![detail_record(3, "2024-06-02 10:00:00")]);
        let source = three_page_source();
        let scheduler = SyncScheduler::new(source.clone(), store);

        let report = scheduler.run().await.unwrap();

        // Watermark 2024-06-02 00:00: page 1 new, page 2 new, page 3 ends old.
        assert_eq!(report.watermark, ts("2024-06-02 00:00:00"));
        assert_eq!(report.stop_reason, StopReason::CaughtUp);
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 3);
        assert_eq!(source.requested_pages(ApiMode::Detail), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_caught_up_first_page_ends_run() {
        let store = MemoryStore::with_records(vec![detail_record(99, "2024-07-01 12:00:00")]);
        let source = three_page_source();
        let scheduler = SyncScheduler::new(source.clone(), store);

        let report = scheduler.run().await.unwrap();

        assert_eq!(report.stop_reason, StopReason::CaughtUp);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.inserted, 0);
        assert_eq!(source.requested_pages(ApiMode::Detail), vec![1]);
    }

    #[tokio::test]
    async fn test_two_new_records_proceed_to_page_two() {
        let source = ScriptedSource::default()
            .with_page(
                ApiMode::Detail,
                1,
                page(vec![raw_record(1, "2024-06-01 10:00:00"), raw_record(2, "2024-06-01 09:00:00")], Some(2)),
            )
            .with_page(ApiMode::Detail, 2, page(vec![], Some(2)));
        let scheduler = SyncScheduler::new(source.clone(), MemoryStore::default());

        let report = scheduler.run().await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(source.requested_pages(ApiMode::Detail), vec![1, 2]);
        assert_eq!(report.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_failed_middle_page_is_skipped() {
        let source = ScriptedSource::default()
            .with_page(ApiMode::Detail, 1, page(vec![raw_record(1, "2024-06-03 10:00:00")], Some(3)))
            .with_failure(ApiMode::Detail, 2, "connection reset")
            .with_page(ApiMode::Detail, 3, page(vec![raw_record(3, "2024-06-01 10:00:00")], Some(3)));
        let scheduler = SyncScheduler::new(source, MemoryStore::default());

        let report = scheduler.run().await.unwrap();

        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_first_page_failure_aborts() {
        let source = ScriptedSource::default().with_failure(ApiMode::Detail, 1, "timeout");
        let scheduler = SyncScheduler::new(source.clone(), MemoryStore::default());

        let err = scheduler.run().await.unwrap_err();

        assert!(matches!(err, SyncError::FirstPageUnavailable(_)));
        assert_eq!(scheduler.store().len(), 0);
        assert_eq!(source.requested_pages(ApiMode::Detail), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_page_count_aborts() {
        let source = ScriptedSource::default()
            .with_page(ApiMode::Detail, 1, page(vec![raw_record(1, "2024-06-03 10:00:00")], None));
        let scheduler = SyncScheduler::new(source, MemoryStore::default());

        let err = scheduler.run().await.unwrap_err();

        assert!(matches!(err, SyncError::FirstPageUnavailable(_)));
        assert_eq!(scheduler.store().len(), 0);
    }

    #[tokio::test]
    async fn test_watermark_never_decreases() {
        let source = three_page_source();
        let scheduler = SyncScheduler::new(source, MemoryStore::default());

        let first = scheduler.run().await.unwrap();
        let second = scheduler.run().await.unwrap();

        assert!(second.watermark >= first.watermark);
        assert_eq!(second.watermark, ts("2024-06-03 00:00:00"));
    }
}
