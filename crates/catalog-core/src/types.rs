//! # Domain Types
//!
//! The remote payload schema and the records persisted locally.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  REMOTE (untyped)              LOCAL (typed, persisted)                │
//! │  ────────────────              ────────────────────────                │
//! │  RawRecord   ──── coerce ────► CatalogRecord  (detail, upserted)       │
//! │              ──── coerce ────► ListingRecord  (list, insert-only)      │
//! │  RawCategory ──── coerce ────► CategoryRecord (seeded once)            │
//! │                                                                         │
//! │  Every raw field is an Option<RawScalar>: the API sends numbers as     │
//! │  strings, strings as numbers, nulls and empty strings interchangeably. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// =============================================================================
// Raw Payload Schema
// =============================================================================

/// A single untyped value as it appears in the remote JSON.
///
/// `Other` catches arrays and objects so one odd field never rejects the
/// record; coercion treats it as unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<&str> for RawScalar {
    fn from(value: &str) -> Self {
        RawScalar::Text(value.to_string())
    }
}

impl From<i64> for RawScalar {
    fn from(value: i64) -> Self {
        RawScalar::Int(value)
    }
}

/// One catalog entry exactly as delivered by the remote API.
///
/// Missing keys and explicit nulls both deserialize to `None`. Keys not
/// named here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub vod_id: Option<RawScalar>,
    pub type_id: Option<RawScalar>,
    pub type_name: Option<RawScalar>,
    pub vod_name: Option<RawScalar>,
    pub vod_sub: Option<RawScalar>,
    pub vod_en: Option<RawScalar>,
    pub vod_pic: Option<RawScalar>,
    pub vod_actor: Option<RawScalar>,
    pub vod_director: Option<RawScalar>,
    pub vod_area: Option<RawScalar>,
    pub vod_lang: Option<RawScalar>,
    pub vod_remarks: Option<RawScalar>,
    pub vod_content: Option<RawScalar>,
    pub vod_class: Option<RawScalar>,
    pub vod_score: Option<RawScalar>,
    pub vod_play_from: Option<RawScalar>,
    pub vod_play_url: Option<RawScalar>,
    pub vod_time: Option<RawScalar>,
    pub vod_year: Option<RawScalar>,
    pub vod_hits: Option<RawScalar>,
    pub vod_hits_day: Option<RawScalar>,
    pub vod_hits_week: Option<RawScalar>,
    pub vod_hits_month: Option<RawScalar>,
    pub vod_total: Option<RawScalar>,
    pub vod_score_num: Option<RawScalar>,
}

/// A category entry from the `class` array of a list-mode response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCategory {
    pub type_id: Option<RawScalar>,
    pub type_pid: Option<RawScalar>,
    pub type_name: Option<RawScalar>,
}

// =============================================================================
// Catalog Record
// =============================================================================

/// A fully coerced catalog entry (detail mode).
///
/// Keyed by `vod_id`. A later sighting of the same id replaces every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogRecord {
    /// External identifier assigned by the remote API.
    pub vod_id: i64,
    pub type_id: i64,
    pub type_name: Option<String>,
    pub vod_name: Option<String>,
    pub vod_sub: Option<String>,
    pub vod_en: Option<String>,
    pub vod_pic: Option<String>,
    pub vod_actor: Option<String>,
    pub vod_director: Option<String>,
    pub vod_area: Option<String>,
    pub vod_lang: Option<String>,
    pub vod_remarks: Option<String>,
    pub vod_content: Option<String>,
    pub vod_class: Option<String>,
    /// Kept as text: the API sends decimal scores such as "8.5".
    pub vod_score: Option<String>,
    pub vod_play_from: Option<String>,
    pub vod_play_url: Option<String>,
    /// Last-modified time. Never null once coerced.
    pub vod_time: NaiveDateTime,
    pub vod_year: i64,
    pub vod_hits: i64,
    pub vod_hits_day: i64,
    pub vod_hits_week: i64,
    pub vod_hits_month: i64,
    pub vod_total: i64,
    pub vod_score_num: i64,
}

// =============================================================================
// Category Record
// =============================================================================

/// A category from the fixed reference set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategoryRecord {
    pub type_id: i64,
    pub type_pid: i64,
    pub type_name: Option<String>,
}

// =============================================================================
// Listing Record
// =============================================================================

/// Lightweight entry from the list endpoint. Insert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ListingRecord {
    pub vod_id: i64,
    pub type_id: i64,
    pub type_name: Option<String>,
    pub vod_name: Option<String>,
    pub vod_en: Option<String>,
    pub vod_remarks: Option<String>,
    pub vod_play_from: Option<String>,
    pub vod_time: Option<NaiveDateTime>,
    pub vod_total: i64,
}
