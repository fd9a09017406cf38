//! # catalog-core: Pure Types for Catalog Sync
//!
//! Record types, the remote payload schema and the coercion rules that turn
//! loosely typed API data into storable records. Nothing in this crate
//! touches the network or the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Sync Data Flow                           │
//! │                                                                         │
//! │  Remote API JSON                                                       │
//! │       │  serde                                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ catalog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   RawRecord ──► coerce ──► CatalogRecord / ListingRecord       │   │
//! │  │   latest vod_time ──► watermark                                │   │
//! │  │   total + limit ──► total_pages                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  catalog-db (SQLite) / catalog-sync (reconciler)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Raw payload schema and persisted record types
//! - [`coerce`] - Integer/text/timestamp coercion with fallbacks
//! - [`watermark`] - Sentinel and day truncation
//! - [`paging`] - Page count arithmetic
//! - [`error`] - Domain error types
//!
//! ## Example
//!
//! ```rust
//! use catalog_core::coerce::{coerce_int, wall_clock_now};
//! use catalog_core::types::RawScalar;
//!
//! assert_eq!(coerce_int(Some(&RawScalar::Text("42".into()))), 42);
//! assert_eq!(coerce_int(Some(&RawScalar::Text("n/a".into()))), 0);
//! let _now = wall_clock_now();
//! ```

pub mod coerce;
pub mod error;
pub mod paging;
pub mod types;
pub mod watermark;

pub use coerce::{Coerced, TimeSource};
pub use error::CoreError;
pub use types::*;
