//! # Field Coercion
//!
//! Turns [`RawRecord`]s into typed records. Coercion never fails:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Coercion Fallbacks                                 │
//! │                                                                         │
//! │  INTEGRAL FIELDS            TIMESTAMP (vod_time)      TEXT FIELDS       │
//! │  ───────────────            ────────────────────      ───────────       │
//! │  42       → 42              "2024-06-01 08:00:00"     "abc" → "abc"     │
//! │  "42"     → 42                → parsed                12    → "12"      │
//! │  " 42 "   → 42              "garbage" → now           ""    → None      │
//! │  4.9      → 4               ""/null/missing → now     null  → None      │
//! │  "n/a"    → 0                                                           │
//! │  null     → 0                                       [..]/{..} → None    │
//! │  missing  → 0                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Now" is passed in by the caller so one record is coerced against a
//! single instant.

use chrono::{Local, NaiveDateTime, Timelike};

use crate::types::{CatalogRecord, CategoryRecord, ListingRecord, RawCategory, RawRecord, RawScalar};

/// Textual format of `vod_time` in the remote payload and in the store.
pub const VOD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where a coerced record's timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Parsed from the payload.
    Remote,
    /// Present but unparseable; replaced with now.
    Malformed,
    /// Absent or empty; replaced with now.
    Missing,
}

/// A coerced record together with the provenance of its timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<T> {
    pub record: T,
    pub time_source: TimeSource,
}

/// Current local wall-clock time at second precision.
pub fn wall_clock_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Coerces a raw scalar to an integer, falling back to `0`.
pub fn coerce_int(value: Option<&RawScalar>) -> i64 {
    match value {
        Some(RawScalar::Int(n)) => *n,
        Some(RawScalar::Float(f)) if f.is_finite() => f.trunc() as i64,
        Some(RawScalar::Bool(b)) => i64::from(*b),
        Some(RawScalar::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Coerces a raw scalar to text. Empty strings and nulls become `None`.
pub fn coerce_text(value: Option<&RawScalar>) -> Option<String> {
    match value? {
        RawScalar::Text(s) if s.is_empty() => None,
        RawScalar::Text(s) => Some(s.clone()),
        RawScalar::Int(n) => Some(n.to_string()),
        RawScalar::Float(f) => Some(f.to_string()),
        RawScalar::Bool(b) => Some(b.to_string()),
        RawScalar::Other(_) => None,
    }
}

/// Parses `vod_time`.
///
/// Returns `(None, Missing)` when the field is absent or empty and
/// `(Some(now), Malformed)` when it cannot be parsed.
pub fn coerce_timestamp(
    value: Option<&RawScalar>,
    now: NaiveDateTime,
) -> (Option<NaiveDateTime>, TimeSource) {
    match value {
        None => (None, TimeSource::Missing),
        Some(RawScalar::Text(s)) if s.is_empty() => (None, TimeSource::Missing),
        Some(RawScalar::Text(s)) => match NaiveDateTime::parse_from_str(s, VOD_TIME_FORMAT) {
            Ok(ts) => (Some(ts), TimeSource::Remote),
            Err(_) => (Some(now), TimeSource::Malformed),
        },
        Some(_) => (Some(now), TimeSource::Malformed),
    }
}

/// Coerces a detail-mode record.
///
/// The returned record's `vod_time` is the effective timestamp: the parsed
/// value, or `now` when the payload had none or an unparseable one.
pub fn coerce_record(raw: &RawRecord, now: NaiveDateTime) -> Coerced<CatalogRecord> {
    let (vod_time, time_source) = coerce_timestamp(raw.vod_time.as_ref(), now);

    let record = CatalogRecord {
        vod_id: coerce_int(raw.vod_id.as_ref()),
        type_id: coerce_int(raw.type_id.as_ref()),
        type_name: coerce_text(raw.type_name.as_ref()),
        vod_name: coerce_text(raw.vod_name.as_ref()),
        vod_sub: coerce_text(raw.vod_sub.as_ref()),
        vod_en: coerce_text(raw.vod_en.as_ref()),
        vod_pic: coerce_text(raw.vod_pic.as_ref()),
        vod_actor: coerce_text(raw.vod_actor.as_ref()),
        vod_director: coerce_text(raw.vod_director.as_ref()),
        vod_area: coerce_text(raw.vod_area.as_ref()),
        vod_lang: coerce_text(raw.vod_lang.as_ref()),
        vod_remarks: coerce_text(raw.vod_remarks.as_ref()),
        vod_content: coerce_text(raw.vod_content.as_ref()),
        vod_class: coerce_text(raw.vod_class.as_ref()),
        vod_score: coerce_text(raw.vod_score.as_ref()),
        vod_play_from: coerce_text(raw.vod_play_from.as_ref()),
        vod_play_url: coerce_text(raw.vod_play_url.as_ref()),
        vod_time: vod_time.unwrap_or(now),
        vod_year: coerce_int(raw.vod_year.as_ref()),
        vod_hits: coerce_int(raw.vod_hits.as_ref()),
        vod_hits_day: coerce_int(raw.vod_hits_day.as_ref()),
        vod_hits_week: coerce_int(raw.vod_hits_week.as_ref()),
        vod_hits_month: coerce_int(raw.vod_hits_month.as_ref()),
        vod_total: coerce_int(raw.vod_total.as_ref()),
        vod_score_num: coerce_int(raw.vod_score_num.as_ref()),
    };

    Coerced { record, time_source }
}

/// Coerces a list-mode record. Only `vod_id`, `type_id` and `vod_total` are
/// integral; a missing `vod_time` stays `None`.
pub fn coerce_listing(raw: &RawRecord, now: NaiveDateTime) -> ListingRecord {
    let (vod_time, _) = coerce_timestamp(raw.vod_time.as_ref(), now);

    ListingRecord {
        vod_id: coerce_int(raw.vod_id.as_ref()),
        type_id: coerce_int(raw.type_id.as_ref()),
        type_name: coerce_text(raw.type_name.as_ref()),
        vod_name: coerce_text(raw.vod_name.as_ref()),
        vod_en: coerce_text(raw.vod_en.as_ref()),
        vod_remarks: coerce_text(raw.vod_remarks.as_ref()),
        vod_play_from: coerce_text(raw.vod_play_from.as_ref()),
        vod_time,
        vod_total: coerce_int(raw.vod_total.as_ref()),
    }
}

/// Coerces a category entry.
pub fn coerce_category(raw: &RawCategory) -> CategoryRecord {
    CategoryRecord {
        type_id: coerce_int(raw.type_id.as_ref()),
        type_pid: coerce_int(raw.type_pid.as_ref()),
        type_name: coerce_text(raw.type_name.as_ref()),
    }
}
