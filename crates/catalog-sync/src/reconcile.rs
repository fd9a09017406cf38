//! # Reconciler
//!
//! Decides, record by record, whether a page brings anything new and how it
//! reaches the store.
//!
//! ## Per-Page Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         reconcile(page)                                 │
//! │                                                                         │
//! │  for each raw record:                                                  │
//! │     coerce ──► vod_id == 0 ? ──yes──► skip (warn)                      │
//! │                    │ no                                                 │
//! │                    ▼                                                    │
//! │     vod_time > watermark ? ──no──► verdict = stop                      │
//! │                    │ yes                                                │
//! │                    ▼                                                    │
//! │     known vod_id ? ──yes──► update now (one write per record)          │
//! │                    │ no                                                 │
//! │                    ▼                                                    │
//! │     pending batch (last occurrence of a vod_id wins)                   │
//! │     verdict = continue                                                 │
//! │                                                                         │
//! │  after loop: insert pending in ONE transaction                         │
//! │  page stop signal = verdict of the LAST evaluated record               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stop signal is the verdict of the last evaluated record, not of the
//! page as a whole. Detail pages arrive newest first, so that is the oldest
//! record on the page. A page not ordered that way can stop a run while
//! newer records sit earlier on it.

use catalog_core::coerce::{coerce_record, wall_clock_now};
use catalog_core::{CatalogRecord, RawRecord, TimeSource};
use chrono::NaiveDateTime;
use tracing::{debug, error, warn};

use crate::store::CatalogStore;

/// What happened to one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// The last evaluated record was not newer than the watermark.
    pub stop: bool,
    pub inserted: usize,
    pub updated: usize,
    /// Records dropped before evaluation (no usable `vod_id`).
    pub skipped: usize,
    /// Lookups or updates that failed.
    pub update_failed: usize,
    /// The pending insert batch was rolled back.
    pub insert_failed: bool,
}

/// Applies pages to a [`CatalogStore`].
pub struct Reconciler<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Reconciler { store }
    }

    /// Reconciles one page of raw records against `watermark`.
    ///
    /// Never fails: store errors are logged and reflected in the outcome.
    pub async fn reconcile(&self, records: &[RawRecord], watermark: NaiveDateTime) -> ReconcileOutcome {
        let now = wall_clock_now();
        let mut outcome = ReconcileOutcome::default();
        let mut pending: Vec<CatalogRecord> = Vec::new();
        let mut last_verdict: Option<bool> = None;

        for raw in records {
            let coerced = coerce_record(raw, now);
            let record = coerced.record;

            if record.vod_id == 0 {
                warn!(vod_id = ?raw.vod_id, "Skipping record without a usable vod_id");
                outcome.skipped += 1;
                continue;
            }

            if coerced.time_source == TimeSource::Malformed {
                warn!(vod_id = record.vod_id, raw = ?raw.vod_time, "Unparseable vod_time, using current time");
            }

            if record.vod_time <= watermark {
                last_verdict = Some(true);
                continue;
            }
            last_verdict = Some(false);

            match self.store.find_by_vod_id(record.vod_id).await {
                Ok(Some(_)) => match self.store.update(&record).await {
                    Ok(()) => outcome.updated += 1,
                    Err(e) => {
                        error!(vod_id = record.vod_id, error = %e, "Update failed");
                        outcome.update_failed += 1;
                    }
                },
                Ok(None) => match pending.iter().position(|p| p.vod_id == record.vod_id) {
                    Some(index) => pending[index] = record,
                    None => pending.push(record),
                },
                Err(e) => {
                    error!(vod_id = record.vod_id, error = %e, "Lookup failed");
                    outcome.update_failed += 1;
                }
            }
        }

        if !pending.is_empty() {
            match self.store.insert_batch(&pending).await {
                Ok(_) => outcome.inserted = pending.len(),
                Err(e) => {
                    error!(count = pending.len(), error = %e, "Insert batch rolled back");
                    outcome.insert_failed = true;
                }
            }
        }

        outcome.stop = last_verdict.unwrap_or(false);

        debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            skipped = outcome.skipped,
            stop = outcome.stop,
            "Page reconciled"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detail_record, raw_record, ts, MemoryStore};
    use catalog_core::RawScalar;

    #[tokio::test]
    async fn test_inserts_new_records_in_one_batch() {
        let store = MemoryStore::default();
        let outcome = Reconciler::new(&store)
            .reconcile(
                &[raw_record(1, "2024-06-02 10:00:00"), raw_record(2, "2024-06-02 09:00:00")],
                ts("2024-06-01 00:00:00"),
            )
            .await;

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.updated, 0);
        assert!(!outcome.stop);
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_updates_known_records_in_place() {
        let store = MemoryStore::with_records(vec![detail_record(5, "2024-05-01 00:00:00")]);

        let mut raw = raw_record(5, "2024-06-02 10:00:00");
        raw.vod_hits = Some("77".into());
        let outcome = Reconciler::new(&store)
            .reconcile(&[raw], ts("2024-06-01 00:00:00"))
            .await;

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.len(), 1);
        let stored = store.get(5).unwrap();
        assert_eq!(stored.vod_hits, 77);
        assert_eq!(stored.vod_time, ts("2024-06-02 10:00:00"));
        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_stop_follows_last_record() {
        let store = MemoryStore::default();
        let watermark = ts("2024-06-01 00:00:00");

        // Old record first, new record last: keep going.
        let outcome = Reconciler::new(&store)
            .reconcile(&[raw_record(1, "2024-01-01 00:00:00"), raw_record(2, "2024-06-05 00:00:00")], watermark)
            .await;
        assert!(!outcome.stop);

        // New record first, old record last: stop even though a record was new.
        let outcome = Reconciler::new(&store)
            .reconcile(&[raw_record(3, "2024-06-05 00:00:00"), raw_record(4, "2024-01-01 00:00:00")], watermark)
            .await;
        assert!(outcome.stop);
        assert_eq!(outcome.inserted, 1);
    }

    #[tokio::test]
    async fn test_day_boundary_is_strict() {
        let store = MemoryStore::default();
        let watermark = ts("2024-06-01 00:00:00");

        let outcome = Reconciler::new(&store)
            .reconcile(&[raw_record(1, "2024-06-01 08:00:00")], watermark)
            .await;
        assert_eq!(outcome.inserted, 1);
        assert!(!outcome.stop);

        let outcome = Reconciler::new(&store)
            .reconcile(&[raw_record(2, "2024-06-01 00:00:00")], watermark)
            .await;
        assert_eq!(outcome.inserted, 0);
        assert!(outcome.stop);
        assert!(store.get(2).is_none());
    }

    #[tokio::test]
    async fn test_empty_page_is_not_a_stop() {
        let store = MemoryStore::default();
        let outcome = Reconciler::new(&store).reconcile(&[], ts("2024-06-01 00:00:00")).await;
        assert_eq!(outcome, ReconcileOutcome::default());
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_last_occurrence() {
        let store = MemoryStore::default();
        let mut first = raw_record(9, "2024-06-02 10:00:00");
        first.vod_name = Some("First".into());
        let mut second = raw_record(9, "2024-06-02 11:00:00");
        second.vod_name = Some("Second".into());

        let outcome = Reconciler::new(&store)
            .reconcile(&[first, second], ts("2024-06-01 00:00:00"))
            .await;

        assert_eq!(outcome.inserted, 1);
        assert_eq!(store.get(9).unwrap().vod_name.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_zero_vod_id_is_skipped() {
        let store = MemoryStore::default();
        let mut raw = raw_record(0, "2024-06-02 10:00:00");
        raw.vod_id = Some(RawScalar::Text("abc".into()));

        let outcome = Reconciler::new(&store)
            .reconcile(&[raw], ts("2024-06-01 00:00:00"))
            .await;

        assert_eq!(outcome.skipped, 1);
        assert!(!outcome.stop);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_time_counts_as_new() {
        let store = MemoryStore::default();
        let mut raw = raw_record(3, "");
        raw.vod_time = None;

        let before = wall_clock_now();
        let outcome = Reconciler::new(&store)
            .reconcile(&[raw], ts("2024-06-01 00:00:00"))
            .await;
        let after = wall_clock_now();

        assert_eq!(outcome.inserted, 1);
        let stored = store.get(3).unwrap().vod_time;
        assert!(stored >= before && stored <= after);
    }

    #[tokio::test]
    async fn test_insert_failure_is_reported_not_raised() {
        let store = MemoryStore::default();
        store.fail_inserts();

        let outcome = Reconciler::new(&store)
            .reconcile(&[raw_record(1, "2024-06-02 10:00:00")], ts("2024-06-01 00:00:00"))
            .await;

        assert!(outcome.insert_failed);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.len(), 0);
    }
}
