//! Day-index ↔ calendar date conversion.
//!
//! Segment indices are whole days counted from 1900-01-01 (index 0).

use chrono::{Datelike, Days, NaiveDate};

/// Calendar date of index 0.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Map a day index to its calendar date, saturating at chrono's date range.
pub fn index_to_date(idx: i64) -> NaiveDate {
    let days = Days::new(idx.unsigned_abs());
    if idx >= 0 {
        epoch().checked_add_days(days).unwrap_or(NaiveDate::MAX)
    } else {
        epoch().checked_sub_days(days).unwrap_or(NaiveDate::MIN)
    }
}

pub fn date_to_index(date: NaiveDate) -> i64 {
    date.signed_duration_since(epoch()).num_days()
}

/// Largest index with a calendar date; [`index_to_date`] saturates beyond it.
pub fn max_index() -> i64 {
    date_to_index(NaiveDate::MAX)
}

/// Index of the first day of the calendar month after the one holding `idx`.
pub fn next_month_start_index(idx: i64) -> i64 {
    let date = index_to_date(idx);
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).map_or(idx + 1, date_to_index)
}

/// Mid-month reporting date (the 15th) for monthly series.
pub fn mid_month(date: NaiveDate) -> NaiveDate {
    date.with_day(15).unwrap_or(date)
}
