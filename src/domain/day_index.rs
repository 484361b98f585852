//! Calendar-day boundaries over a bar sequence.
//!
//! A [`DayIndex`] holds half-open offset ranges into a ticker's bar vector,
//! one per calendar day. The bar vector is append-mostly, so the index is
//! extended from where it last stopped instead of being rebuilt.

use crate::domain::bar::PriceBar;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
}

impl DayEntry {
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn bar_count(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayIndex {
    entries: Vec<DayEntry>,
}

impl DayIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<DayEntry>) -> Self {
        Self { entries }
    }

    pub fn build(bars: &[PriceBar]) -> Self {
        let mut index = Self::new();
        index.extend(bars);
        index
    }

    pub fn entries(&self) -> &[DayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&DayEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&DayEntry> {
        self.entries.last()
    }

    /// Offset scanning resumes from on the next [`extend`](Self::extend).
    pub fn indexed_len(&self) -> usize {
        self.entries.last().map_or(0, |e| e.end)
    }

    /// Scans `bars` from the current end of the index.
    ///
    /// Same-day bars stretch the final entry; a change of calendar date opens
    /// a new one. Returns the number of entries added.
    pub fn extend(&mut self, bars: &[PriceBar]) -> usize {
        let before = self.entries.len();
        let mut from = self.indexed_len();

        if self.entries.is_empty() {
            let Some(first) = bars.first() else {
                return 0;
            };
            self.entries.push(DayEntry {
                date: first.date(),
                start: 0,
                end: 1,
            });
            from = 1;
        }

        for i in from..bars.len() {
            let date = bars[i].date();
            if date != bars[i - 1].date() {
                self.entries.push(DayEntry {
                    date,
                    start: i,
                    end: i + 1,
                });
            } else if let Some(last) = self.entries.last_mut() {
                last.end = i + 1;
            }
        }

        self.entries.len() - before
    }

    /// Drops every entry that does not end at or before `offset`.
    ///
    /// Used before re-scanning after bars were inserted at `offset`.
    pub fn rewind(&mut self, offset: usize) {
        let keep = self.entries.partition_point(|e| e.end <= offset);
        self.entries.truncate(keep);
    }

    /// Position of the entry for `date`.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.entries.binary_search_by_key(&date, |e| e.date).ok()
    }

    pub fn find(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.position(date).map(|i| &self.entries[i])
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().map(|e| e.date)
    }

    /// Checks ordering, contiguity and coverage of `len` bars.
    pub fn is_consistent(&self, len: usize) -> bool {
        let Some(first) = self.entries.first() else {
            return len == 0;
        };
        if first.start != 0 {
            return false;
        }
        for pair in self.entries.windows(2) {
            if pair[0].end != pair[1].start || pair[0].date >= pair[1].date {
                return false;
            }
        }
        self.entries
            .iter()
            .all(|e| e.start < e.end)
            && self.indexed_len() == len
    }

    /// Checks that every entry agrees with the dates of the bars it covers.
    pub fn matches(&self, bars: &[PriceBar]) -> bool {
        self.is_consistent(bars.len())
            && self
                .entries
                .iter()
                .all(|e| bars[e.range()].iter().all(|b| b.date() == e.date))
    }
}
