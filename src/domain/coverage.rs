//! Data-quality verification against a Monday–Friday calendar.
//!
//! No holiday calendar: every weekday in range is expected, so exchange
//! holidays show up as missing days.

use crate::domain::store::TimeSeriesStore;
use crate::domain::ticker::Ticker;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet};

/// One-minute bars in a full 09:30–15:59 regular session.
pub const FULL_SESSION_MINUTES: usize = 389;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Weekdays without data plus indexed days that are not weekdays.
    pub missing_days: BTreeMap<Ticker, Vec<NaiveDate>>,
    /// Days below a full session, with the number of missing minutes.
    pub missing_minutes: BTreeMap<Ticker, Vec<(NaiveDate, usize)>>,
}

impl CoverageReport {
    pub fn is_clean(&self) -> bool {
        self.missing_days.is_empty() && self.missing_minutes.is_empty()
    }
}

/// Weekdays in `[start, end]`.
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Checks every ticker's indexed days in `[start, end]` against the expected
/// weekdays. Bounds default to the store's overall date span.
pub fn verify_coverage(
    store: &TimeSeriesStore,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    minute_check: bool,
) -> CoverageReport {
    let mut report = CoverageReport::default();
    let span = store.date_span();
    let (Some(start), Some(end)) = (start.or(span.map(|s| s.0)), end.or(span.map(|s| s.1)))
    else {
        return report;
    };

    let expected: BTreeSet<NaiveDate> = weekdays_between(start, end).into_iter().collect();

    for (ticker, series) in store.iter() {
        let in_range = series
            .day_index()
            .entries()
            .iter()
            .filter(|e| e.date >= start && e.date <= end);

        let actual: BTreeSet<NaiveDate> = in_range.clone().map(|e| e.date).collect();
        let missing: Vec<NaiveDate> = expected.symmetric_difference(&actual).copied().collect();
        if !missing.is_empty() {
            report.missing_days.insert(ticker.clone(), missing);
        }

        if minute_check {
            let short: Vec<(NaiveDate, usize)> = in_range
                .filter(|e| e.bar_count() < FULL_SESSION_MINUTES)
                .map(|e| (e.date, FULL_SESSION_MINUTES - e.bar_count()))
                .collect();
            if !short.is_empty() {
                report.missing_minutes.insert(ticker.clone(), short);
            }
        }
    }

    report
}

impl TimeSeriesStore {
    /// See [`verify_coverage`].
    pub fn verify_coverage(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        minute_check: bool,
    ) -> CoverageReport {
        verify_coverage(self, start, end, minute_check)
    }
}
