//! Multi-ticker store of minute bars with per-ticker day indexes.

use crate::domain::bar::PriceBar;
use crate::domain::day_index::{DayEntry, DayIndex};
use crate::domain::error::PackError;
use crate::domain::series::{IngestSummary, TickerSeries};
use crate::domain::ticker::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::slice;
use tracing::debug;

/// Owns every ticker's [`TickerSeries`]. Iteration is alphabetical by ticker.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    series: BTreeMap<Ticker, TickerSeries>,
}

/// Persistence blob: ticker → bars and ticker → day index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub series: BTreeMap<Ticker, Vec<PriceBar>>,
    pub day_index: BTreeMap<Ticker, Vec<DayEntry>>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, ticker: &str) -> bool {
        self.lookup(ticker).is_some()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &TickerSeries)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Resolves `ticker` to its stored key, or `UnknownTicker`.
    pub fn ticker(&self, ticker: &str) -> Result<&Ticker, PackError> {
        self.lookup(ticker)
            .map(|(t, _)| t)
            .ok_or_else(|| PackError::UnknownTicker {
                ticker: ticker.to_string(),
            })
    }

    pub fn series(&self, ticker: &str) -> Result<&TickerSeries, PackError> {
        self.lookup(ticker)
            .map(|(_, s)| s)
            .ok_or_else(|| PackError::UnknownTicker {
                ticker: ticker.to_string(),
            })
    }

    fn lookup(&self, ticker: &str) -> Option<(&Ticker, &TickerSeries)> {
        let key = Ticker::new(ticker).ok()?;
        self.series.get_key_value(&key)
    }

    /// Appends bars for `ticker`, creating the series on first use.
    ///
    /// An empty batch never creates a series.
    pub fn ingest(
        &mut self,
        ticker: &str,
        bars: Vec<PriceBar>,
    ) -> Result<IngestSummary, PackError> {
        let key = Ticker::new(ticker)?;
        if bars.is_empty() && !self.series.contains_key(&key) {
            return Ok(IngestSummary::default());
        }
        let series = self.series.entry(key).or_default();
        let summary = series.ingest(bars);
        debug!(
            ticker,
            added = summary.added,
            duplicates = summary.duplicates,
            days_added = summary.days_added,
            backfilled = summary.backfilled,
            "ingested bars"
        );
        Ok(summary)
    }

    /// Contiguous bars from the first bar of `start` to the last bar of `end`.
    ///
    /// Omitted bounds default to the first and last indexed day.
    pub fn slice_by_date(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<&[PriceBar], PackError> {
        let series = self.series(ticker)?;
        let index = series.day_index();
        let lookup = |date: NaiveDate| {
            index.find(date).ok_or_else(|| PackError::NotFound {
                ticker: ticker.to_string(),
                date,
            })
        };

        let from = match start {
            Some(date) => lookup(date)?.start,
            None => index.first().map_or(0, |e| e.start),
        };
        let to = match end {
            Some(date) => lookup(date)?.end,
            None => index.indexed_len(),
        };

        if from >= to {
            return Ok(&[]);
        }
        Ok(&series.bars()[from..to])
    }

    /// One `(date, bars)` pair per indexed day, ascending.
    pub fn data_by_date(&self, ticker: &str) -> Result<DaySlices<'_>, PackError> {
        let series = self.series(ticker)?;
        Ok(DaySlices {
            bars: series.bars(),
            entries: series.day_index().entries().iter(),
        })
    }

    /// Earliest and latest indexed day across all tickers.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self
            .series
            .values()
            .filter_map(|s| s.day_index().first())
            .map(|e| e.date)
            .min()?;
        let last = self
            .series
            .values()
            .filter_map(|s| s.day_index().last())
            .map(|e| e.date)
            .max()?;
        Some((first, last))
    }

    pub fn export_state(&self) -> StoreState {
        let mut state = StoreState::default();
        for (ticker, series) in &self.series {
            state.series.insert(ticker.clone(), series.bars().to_vec());
            state
                .day_index
                .insert(ticker.clone(), series.day_index().entries().to_vec());
        }
        state
    }

    /// Rebuilds a store from a persisted [`StoreState`].
    ///
    /// Every ticker must carry both a series and an index that agree with
    /// each other; nothing is returned if any ticker fails.
    pub fn import_state(state: StoreState) -> Result<Self, PackError> {
        let StoreState {
            series,
            mut day_index,
        } = state;

        let mut store = BTreeMap::new();
        for (ticker, bars) in series {
            let entries = day_index.remove(&ticker).ok_or_else(|| PackError::State {
                reason: format!("no day index for {ticker}"),
            })?;
            let parts = TickerSeries::from_parts_checked(bars, DayIndex::from_entries(entries))
                .map_err(|reason| PackError::State {
                    reason: format!("{ticker}: {reason}"),
                })?;
            store.insert(ticker, parts);
        }
        if let Some(orphan) = day_index.keys().next() {
            return Err(PackError::State {
                reason: format!("day index for {orphan} has no series"),
            });
        }

        Ok(Self { series: store })
    }
}

/// Restartable iterator over a ticker's days; clone it to iterate again.
#[derive(Debug, Clone)]
pub struct DaySlices<'a> {
    bars: &'a [PriceBar],
    entries: slice::Iter<'a, DayEntry>,
}

impl<'a> Iterator for DaySlices<'a> {
    type Item = (NaiveDate, &'a [PriceBar]);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some((entry.date, &self.bars[entry.range()]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for DaySlices<'_> {}
