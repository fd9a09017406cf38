//! # Page Count Arithmetic
//!
//! The remote API reports `total` records and a page size `limit`; the
//! number of pages is their ceiling quotient in integer arithmetic.

use crate::error::{CoreError, CoreResult};

/// Number of pages needed to hold `total` records at `limit` per page.
///
/// ## Examples
/// ```rust
/// use catalog_core::paging::total_pages;
///
/// assert_eq!(total_pages(101, 20).unwrap(), 6);
/// assert_eq!(total_pages(100, 20).unwrap(), 5);
/// assert_eq!(total_pages(0, 20).unwrap(), 0);
/// ```
pub fn total_pages(total: i64, limit: i64) -> CoreResult<u32> {
    if limit <= 0 {
        return Err(CoreError::InvalidPageSize(limit));
    }
    if total < 0 {
        return Err(CoreError::NegativeTotal(total));
    }

    let pages = if total % limit != 0 {
        total / limit + 1
    } else {
        total / limit
    };

    Ok(u32::try_from(pages).unwrap_or(u32::MAX))
}
