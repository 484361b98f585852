//! Per-ticker bar sequence and its day index.

use crate::domain::bar::PriceBar;
use crate::domain::day_index::{DayEntry, DayIndex};
use chrono::NaiveDate;

/// Outcome of one [`TickerSeries::ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub added: usize,
    pub duplicates: usize,
    pub days_added: usize,
    /// Some bar landed before the previous end of the series.
    pub backfilled: bool,
}

/// Bars sorted strictly ascending by timestamp, plus their [`DayIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerSeries {
    bars: Vec<PriceBar>,
    days: DayIndex,
}

impl TickerSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from parts that were already validated, e.g. by
    /// [`from_parts_checked`](Self::from_parts_checked).
    pub(crate) fn from_parts(bars: Vec<PriceBar>, days: DayIndex) -> Self {
        Self { bars, days }
    }

    /// Accepts stored parts only if the bars are strictly ascending and the
    /// index matches them.
    pub fn from_parts_checked(bars: Vec<PriceBar>, days: DayIndex) -> Result<Self, String> {
        if let Some(i) = bars
            .windows(2)
            .position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(format!(
                "bars not strictly ascending at offset {} ({})",
                i + 1,
                bars[i + 1].timestamp
            ));
        }
        if !days.matches(&bars) {
            return Err("day index does not match bars".into());
        }
        Ok(Self::from_parts(bars, days))
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn day_index(&self) -> &DayIndex {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.days.find(date)
    }

    pub fn day_bars(&self, date: NaiveDate) -> Option<&[PriceBar]> {
        self.day(date).map(|e| &self.bars[e.range()])
    }

    /// Merges `new_bars` into the series.
    ///
    /// New bars are sorted and deduplicated keeping the first occurrence;
    /// timestamps already present keep the stored bar. Only the stored tail
    /// from the first incoming timestamp onward is examined, so the cost
    /// follows the overlap and the new data, not the whole history. Pure
    /// appends extend the index from its previous end, back-fills rewind it
    /// to the last day that ends before the first inserted bar.
    pub fn ingest(&mut self, mut new_bars: Vec<PriceBar>) -> IngestSummary {
        let offered = new_bars.len();
        new_bars.sort_by_key(|b| b.timestamp);
        new_bars.dedup_by_key(|b| b.timestamp);

        let Some(first) = new_bars.first() else {
            return IngestSummary {
                duplicates: offered,
                ..IngestSummary::default()
            };
        };
        let overlap = self.bars.partition_point(|b| b.timestamp < first.timestamp);
        let tail = &self.bars[overlap..];
        new_bars.retain(|b| tail.binary_search_by_key(&b.timestamp, |t| t.timestamp).is_err());

        let added = new_bars.len();
        let Some(first) = new_bars.first() else {
            return IngestSummary {
                duplicates: offered,
                ..IngestSummary::default()
            };
        };
        let first_insert = overlap + tail.partition_point(|b| b.timestamp < first.timestamp);
        let days_before = self.days.len();
        let backfilled = first_insert < self.bars.len();

        if backfilled {
            let displaced = self.bars.split_off(first_insert);
            self.bars.extend(merge_disjoint(displaced, new_bars));
            self.days.rewind(first_insert);
        } else {
            self.bars.extend(new_bars);
        }
        self.days.extend(&self.bars);

        IngestSummary {
            added,
            duplicates: offered - added,
            days_added: self.days.len().saturating_sub(days_before),
            backfilled,
        }
    }
}

/// Merges two ascending runs that share no timestamp.
fn merge_disjoint(existing: Vec<PriceBar>, incoming: Vec<PriceBar>) -> Vec<PriceBar> {
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    let mut old = existing.into_iter().peekable();

    for bar in incoming {
        while let Some(prev) = old.next_if(|b| b.timestamp < bar.timestamp) {
            merged.push(prev);
        }
        merged.push(bar);
    }
    merged.extend(old);
    merged
}
