//! Daily series generation and monthly roll-up.
//!
//! Every series of a well is generated against the same [`IndexWindow`], so
//! head padding, synthetic tail segments and the daily budget leave all of
//! them with identical lengths.

use chrono::NaiveDate;

use super::dates::{index_to_date, mid_month, next_month_start_index};
use super::segments::daily_volumes_between;
use crate::model::{Resolution, Segment};

/// Up-front buffer bound for one daily series; longer series grow as they fill.
const MAX_PREALLOCATED_DAYS: usize = 100 * 366;

/// Inclusive day-index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWindow {
    pub start: i64,
    pub end: i64,
}

impl IndexWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        usize::try_from(self.end - self.start + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Remaining number of days a daily series may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBudget {
    remaining: Option<usize>,
}

impl DayBudget {
    pub fn unlimited() -> Self {
        Self { remaining: None }
    }

    /// `ceil(years * 365) + 1` days; a non-positive limit means unlimited.
    pub fn from_year_limit(years: f64) -> Self {
        if years > 0.0 && years.is_finite() {
            let days = (years * 365.0).ceil() as usize + 1;
            Self { remaining: Some(days) }
        } else {
            Self::unlimited()
        }
    }

    /// Budget for one series at `resolution`. Monthly output is never limited.
    pub fn for_resolution(resolution: Resolution, daily_year_limit: f64) -> Self {
        match resolution {
            Resolution::Daily => Self::from_year_limit(daily_year_limit),
            Resolution::Monthly => Self::unlimited(),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.remaining
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Grant up to `wanted` days and charge them.
    fn take(&mut self, wanted: usize) -> usize {
        match &mut self.remaining {
            None => wanted,
            Some(left) => {
                let granted = wanted.min(*left);
                *left -= granted;
                granted
            }
        }
    }
}

/// Generate one value per day of `window` from an ordered segment list.
///
/// Days before the first segment (and any gap between segments) are padded
/// with zeros, charged to `budget` first. A synthetic `empty` segment carries
/// a short series to `window.end`. Once the budget runs out the remaining
/// segments are skipped.
pub fn daily_series(segments: &[Segment], window: IndexWindow, mut budget: DayBudget) -> Vec<f64> {
    let wanted = budget.limit().map_or(window.len(), |l| l.min(window.len()));
    let mut out = Vec::with_capacity(wanted.min(MAX_PREALLOCATED_DAYS));
    let mut cursor = window.start;

    let last_end = segments.last().map_or(window.start - 1, |s| s.end_idx);
    let tail = (last_end < window.end).then(|| Segment::empty(last_end.max(cursor - 1) + 1, window.end));

    for segment in segments.iter().chain(tail.iter()) {
        if budget.is_exhausted() {
            break;
        }
        let from = segment.start_idx.max(cursor);
        let to = segment.end_idx.min(window.end);
        if from > to {
            continue;
        }

        if from > cursor {
            let pad = budget.take(usize::try_from(from - cursor).unwrap_or(0));
            out.resize(out.len() + pad, 0.0);
            if budget.is_exhausted() {
                break;
            }
        }

        let granted = budget.take(usize::try_from(to - from + 1).unwrap_or(0));
        let granted_end = from + i64::try_from(granted).unwrap_or(i64::MAX) - 1;
        out.extend(daily_volumes_between(segment, from, granted_end));
        cursor = granted_end + 1;
    }

    out
}

/// Sum daily values into calendar months, the first day being `start_idx`.
pub fn monthly_rollup(daily: &[f64], start_idx: i64) -> Vec<f64> {
    let mut months = Vec::new();
    let mut boundary = next_month_start_index(start_idx);
    let mut acc = 0.0;

    for (idx, value) in (start_idx..).zip(daily) {
        if idx >= boundary {
            months.push(acc);
            acc = 0.0;
            boundary = next_month_start_index(idx);
        }
        acc += value;
    }
    if !daily.is_empty() {
        months.push(acc);
    }
    months
}

/// Volumes of one series at the requested resolution, with reporting dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVolumes {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub volumes: Vec<f64>,
}

/// Turn a daily series starting at `start_idx` into its `resolution` form.
pub fn resolve(daily: Vec<f64>, start_idx: i64, resolution: Resolution) -> ResolvedVolumes {
    let end_idx = start_idx + i64::try_from(daily.len()).unwrap_or(i64::MAX).max(1) - 1;
    match resolution {
        Resolution::Daily => ResolvedVolumes {
            start_date: index_to_date(start_idx),
            end_date: index_to_date(end_idx),
            volumes: daily,
        },
        Resolution::Monthly => ResolvedVolumes {
            start_date: mid_month(index_to_date(start_idx)),
            end_date: mid_month(index_to_date(end_idx)),
            volumes: monthly_rollup(&daily, start_idx),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentKind;
    use crate::volumes::dates::date_to_index;

    fn flat(start: i64, end: i64, c: f64) -> Segment {
        let mut s = Segment::with_kind(SegmentKind::Flat, start, end);
        s.c = c;
        s
    }

    #[test]
    fn test_year_limit_budget() {
        assert_eq!(DayBudget::from_year_limit(1.0).limit(), Some(366));
        assert_eq!(DayBudget::from_year_limit(0.5).limit(), Some(184));
        assert_eq!(DayBudget::from_year_limit(0.0).limit(), None);
        assert_eq!(DayBudget::from_year_limit(-3.0).limit(), None);
        assert_eq!(DayBudget::for_resolution(Resolution::Monthly, 1.0).limit(), None);
    }

    #[test]
    fn test_series_padded_to_window() {
        let window = IndexWindow::new(100, 149);
        let v = daily_series(&[flat(110, 129, 2.0)], window, DayBudget::unlimited());
        assert_eq!(v.len(), 50);
        assert!(v[..10].iter().all(|x| *x == 0.0));
        assert!(v[10..30].iter().all(|x| (*x - 2.0).abs() < 1e-12));
        assert!(v[30..].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_series_clipped_to_narrow_window() {
        let window = IndexWindow::new(105, 114);
        let v = daily_series(&[flat(100, 109, 1.0), flat(110, 200, 3.0)], window, DayBudget::unlimited());
        assert_eq!(v.len(), 10);
        assert!((v[0] - 1.0).abs() < 1e-12);
        assert!((v[9] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_budget_charges_head_padding_first() {
        let window = IndexWindow::new(0, 999);
        let budget = DayBudget::from_year_limit(0.1); // 38 days
        let v = daily_series(&[flat(30, 999, 1.0)], window, budget);
        assert_eq!(v.len(), 38);
        assert_eq!(v.iter().filter(|x| **x > 0.0).count(), 8);
    }

    #[test]
    fn test_budget_skips_later_segments() {
        let window = IndexWindow::new(0, 99);
        let segments = [flat(0, 9, 1.0), flat(10, 49, 2.0), flat(50, 99, 3.0)];
        let v = daily_series(&segments, window, DayBudget::from_year_limit(0.05)); // 20 days
        assert_eq!(v.len(), 20);
        assert!(v.iter().all(|x| *x < 2.5));
    }

    #[test]
    fn test_budget_exhausted_by_padding_only() {
        let window = IndexWindow::new(0, 999);
        let v = daily_series(&[flat(500, 999, 1.0)], window, DayBudget::from_year_limit(0.01));
        assert_eq!(v.len(), 5);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_far_end_index_with_budget_stays_bounded() {
        let window = IndexWindow::new(100, 1_000_000_000);
        let v = daily_series(&[flat(100, 1_000_000_000, 1.0)], window, DayBudget::from_year_limit(1.0));
        assert_eq!(v.len(), 366);
        assert!(v.capacity() <= MAX_PREALLOCATED_DAYS);
    }

    #[test]
    fn test_empty_segment_list_is_all_zeros() {
        let v = daily_series(&[], IndexWindow::new(10, 19), DayBudget::unlimited());
        assert_eq!(v, vec![0.0; 10]);
    }

    #[test]
    fn test_monthly_rollup_of_constant() {
        let start = date_to_index(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let daily = vec![2.0; 29 + 31];
        let months = monthly_rollup(&daily, start);
        assert_eq!(months, vec![58.0, 62.0]);
    }

    #[test]
    fn test_monthly_rollup_flushes_partial_months() {
        let start = date_to_index(NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
        let months = monthly_rollup(&[1.0; 5], start);
        assert_eq!(months, vec![2.0, 3.0]);
    }

    #[test]
    fn test_resolve_monthly_reports_mid_month() {
        let start = date_to_index(NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
        let resolved = resolve(vec![1.0; 40], start, Resolution::Monthly);
        assert_eq!(resolved.start_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(resolved.end_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(resolved.volumes.len(), 3);
    }

    #[test]
    fn test_resolve_daily_dates_match_length() {
        let resolved = resolve(vec![0.0; 10], 1000, Resolution::Daily);
        assert_eq!(resolved.start_date, index_to_date(1000));
        assert_eq!(resolved.end_date, index_to_date(1009));
    }
}
