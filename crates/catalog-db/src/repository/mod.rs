//! # Repository Module
//!
//! One repository per table; each owns a clone of the pool and all SQL for
//! its table.
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Detail records: lookup, update, batch insert, watermark query
//! - [`CategoryRepository`](category::CategoryRepository) - Category reference set
//! - [`ListingRepository`](listing::ListingRepository) - Insert-only listing rows

pub mod catalog;
pub mod category;
pub mod listing;
