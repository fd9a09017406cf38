//! # catalog-sync: Incremental Sync Engine
//!
//! Pulls catalog pages from the remote API and reconciles them against the
//! local store, stopping as soon as the remote data is known to be covered.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 SyncScheduler (one incremental run)              │  │
//! │  │                                                                  │  │
//! │  │  Computes the watermark once, walks detail pages 1..N            │  │
//! │  │  and halts on the first page whose last record is covered        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Watermark    │  │   PageSource   │  │     Reconciler         │    │
//! │  │                │  │                │  │                        │    │
//! │  │ max(vod_time)  │  │ GET ac=detail  │  │ coerce, compare,       │    │
//! │  │ → midnight     │  │ &pg=N, 30s     │  │ update or batch insert │    │
//! │  │ or 2000-01-01  │  │ timeout        │  │ emits stop signal      │    │
//! │  └────────────────┘  └────────────────┘  └───────────┬────────────┘    │
//! │                                                       │                 │
//! │                                                       ▼                 │
//! │                                           ┌────────────────────────┐   │
//! │                                           │   CatalogStore         │   │
//! │                                           │   (catalog-db SQLite)  │   │
//! │                                           └────────────────────────┘   │
//! │                                                                         │
//! │  CatalogCrawler: category seeding, explicit ranges with retry,         │
//! │  full crawl, listing crawl. Shares PageSource and Reconciler.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types
//! - [`source`] - `PageSource` trait and the HTTP implementation
//! - [`store`] - `CatalogStore` trait over the catalog repository
//! - [`watermark`] - Caught-up cutoff
//! - [`reconcile`] - Insert vs update, stop signal
//! - [`scheduler`] - Incremental run driver
//! - [`crawler`] - Range, full and listing crawls
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_sync::{HttpPageSource, SyncConfig, SyncScheduler};
//! use catalog_db::{Database, DbConfig};
//!
//! let config = SyncConfig::load(None)?;
//! let db = Database::new(DbConfig::new(&config.database.path)).await?;
//! let source = HttpPageSource::new(&config.api)?;
//!
//! let report = SyncScheduler::new(source, db.catalog()).run().await?;
//! println!("inserted {} updated {}", report.inserted, report.updated);
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod watermark;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SyncConfig;
pub use crawler::{CatalogCrawler, CrawlSummary, StoreStatus};
pub use error::{SyncError, SyncResult};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use scheduler::{ScanState, StopReason, SyncReport, SyncScheduler};
pub use source::{ApiMode, CatalogPage, HttpPageSource, PageSource};
pub use store::CatalogStore;
pub use watermark::Watermark;
