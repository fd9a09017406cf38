//! # Watermark Arithmetic
//!
//! The watermark is the point up to which the local store is considered
//! caught up. It is derived from the newest `vod_time` in the store:
//!
//! ```text
//!   store empty                     → 2000-01-01 00:00:00 (sentinel)
//!   max(vod_time) = 2024-06-01 17:42 → 2024-06-01 00:00:00
//! ```
//!
//! Dropping the time of day widens the window so records that share the
//! newest day are re-examined on the next run.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// The watermark used when the store holds no catalog records.
pub fn sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Drops the time of day.
pub fn truncate_to_day(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date().and_time(NaiveTime::default())
}

/// Derives the watermark from the newest stored `vod_time`.
pub fn derive(latest: Option<NaiveDateTime>) -> NaiveDateTime {
    latest.map(truncate_to_day).unwrap_or_else(sentinel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_year_2000() {
        assert_eq!(sentinel().to_string(), "2000-01-01 00:00:00");
    }

    #[test]
    fn test_derive_truncates_to_midnight() {
        let latest = NaiveDateTime::parse_from_str("2024-06-01 17:42:09", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(derive(Some(latest)).to_string(), "2024-06-01 00:00:00");
    }

    #[test]
    fn test_derive_empty_store() {
        assert_eq!(derive(None), sentinel());
    }
}
