//! In-memory fakes shared by the engine's unit tests.

use async_trait::async_trait;
use catalog_core::{CatalogRecord, RawRecord, RawScalar};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::{SyncError, SyncResult};
use crate::source::{ApiMode, CatalogPage, PageSource};
use crate::store::CatalogStore;

pub fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A fully populated stored record.
pub fn detail_record(vod_id: i64, vod_time: &str) -> CatalogRecord {
    CatalogRecord {
        vod_id,
        type_id: 1,
        type_name: Some("Movies".into()),
        vod_name: Some(format!("Title {vod_id}")),
        vod_sub: None,
        vod_en: None,
        vod_pic: None,
        vod_actor: None,
        vod_director: None,
        vod_area: None,
        vod_lang: None,
        vod_remarks: None,
        vod_content: None,
        vod_class: None,
        vod_score: None,
        vod_play_from: None,
        vod_play_url: None,
        vod_time: ts(vod_time),
        vod_year: 2024,
        vod_hits: 0,
        vod_hits_day: 0,
        vod_hits_week: 0,
        vod_hits_month: 0,
        vod_total: 0,
        vod_score_num: 0,
    }
}

/// A remote record as the API would send it.
pub fn raw_record(vod_id: i64, vod_time: &str) -> RawRecord {
    RawRecord {
        vod_id: Some(RawScalar::Int(vod_id)),
        type_id: Some("1".into()),
        type_name: Some("Movies".into()),
        vod_name: Some(RawScalar::Text(format!("Title {vod_id}"))),
        vod_year: Some("2024".into()),
        vod_time: Some(vod_time.into()),
        ..Default::default()
    }
}

pub fn page(records: Vec<RawRecord>, total_pages: Option<u32>) -> CatalogPage {
    CatalogPage {
        records,
        categories: Vec::new(),
        total_pages,
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

#[derive(Default)]
struct StoreState {
    records: BTreeMap<i64, CatalogRecord>,
    fail_reads: bool,
    fail_inserts: bool,
    update_calls: usize,
    insert_calls: usize,
}

/// Map-backed [`CatalogStore`]. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        let store = MemoryStore::default();
        {
            let mut state = store.state.lock().unwrap();
            for record in records {
                state.records.insert(record.vod_id, record);
            }
        }
        store
    }

    pub fn fail_reads(&self) {
        self.state.lock().unwrap().fail_reads = true;
    }

    pub fn fail_inserts(&self) {
        self.state.lock().unwrap().fail_inserts = true;
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn get(&self, vod_id: i64) -> Option<CatalogRecord> {
        self.state.lock().unwrap().records.get(&vod_id).cloned()
    }

    pub fn snapshot(&self) -> Vec<CatalogRecord> {
        self.state.lock().unwrap().records.values().cloned().collect()
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn latest_vod_time(&self) -> SyncResult<Option<NaiveDateTime>> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(SyncError::DatabaseError("read failed".into()));
        }
        Ok(state.records.values().map(|r| r.vod_time).max())
    }

    async fn find_by_vod_id(&self, vod_id: i64) -> SyncResult<Option<CatalogRecord>> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(SyncError::DatabaseError("read failed".into()));
        }
        Ok(state.records.get(&vod_id).cloned())
    }

    async fn update(&self, record: &CatalogRecord) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        match state.records.get_mut(&record.vod_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(SyncError::DatabaseError("not found".into())),
        }
    }

    async fn insert_batch(&self, records: &[CatalogRecord]) -> SyncResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_inserts {
            return Err(SyncError::DatabaseError("disk full".into()));
        }
        if records.iter().any(|r| state.records.contains_key(&r.vod_id)) {
            return Err(SyncError::DatabaseError("UNIQUE constraint failed".into()));
        }
        for record in records {
            state.records.insert(record.vod_id, record.clone());
        }
        Ok(records.len() as u64)
    }
}

// =============================================================================
// ScriptedSource
// =============================================================================

/// [`PageSource`] that replays queued responses per `(mode, page)`.
///
/// Unscripted pages fail with a transport error. A page scripted once is
/// served for every later request once its queue holds a single entry.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pages: Arc<Mutex<HashMap<(ApiMode, u32), VecDeque<Result<CatalogPage, String>>>>>,
    requests: Arc<Mutex<Vec<(ApiMode, u32)>>>,
}

impl ScriptedSource {
    pub fn with_page(self, mode: ApiMode, page: u32, result: CatalogPage) -> Self {
        self.push(mode, page, Ok(result));
        self
    }

    pub fn with_failure(self, mode: ApiMode, page: u32, message: &str) -> Self {
        self.push(mode, page, Err(message.to_string()));
        self
    }

    fn push(&self, mode: ApiMode, page: u32, result: Result<CatalogPage, String>) {
        self.pages
            .lock()
            .unwrap()
            .entry((mode, page))
            .or_default()
            .push_back(result);
    }

    pub fn requests(&self) -> Vec<(ApiMode, u32)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_pages(&self, mode: ApiMode) -> Vec<u32> {
        self.requests()
            .into_iter()
            .filter(|(m, _)| *m == mode)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, mode: ApiMode, page: u32) -> SyncResult<CatalogPage> {
        self.requests.lock().unwrap().push((mode, page));

        let mut pages = self.pages.lock().unwrap();
        let queue = match pages.get_mut(&(mode, page)) {
            Some(queue) => queue,
            None => return Err(SyncError::Http(format!("no route for {mode} page {page}"))),
        };

        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match next {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(SyncError::Http(message)),
            None => Err(SyncError::Http(format!("no route for {mode} page {page}"))),
        }
    }
}
