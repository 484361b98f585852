//! Pack correlation engine.
//!
//! For each of alpha's trading days, every other ticker's intraday close path
//! is correlated against alpha's and the cross-section is reduced to a
//! [`CorrelationRecord`]. Records and distributions are cached; they are
//! derived data for one alpha and are dropped when alpha changes.

use crate::domain::bar::{closes, PriceBar};
use crate::domain::correlation::{
    summarize_day, CorrelationRecord, CorrelationTable, DistributionStore, HeatmapMatrix,
    HistogramStats,
};
use crate::domain::day_index::DayEntry;
use crate::domain::error::PackError;
use crate::domain::stats;
use crate::domain::store::TimeSeriesStore;
use crate::domain::ticker::Ticker;
use chrono::NaiveDate;
use std::fmt;
use std::ops::Range;
use tracing::{debug, warn};

/// Bars a ticker may trail alpha by on a day before it is treated as a
/// partial day and left out.
pub const DEFAULT_PARTIAL_DAY_TOLERANCE: usize = 10;

/// Resolves Python-style slice bounds against a sequence of `len` items.
///
/// Negative bounds count from the end; out-of-range bounds clamp.
pub fn resolve_slice(len: usize, start: Option<isize>, end: Option<isize>) -> Range<usize> {
    let clamp = |bound: isize| -> usize {
        if bound < 0 {
            len.saturating_sub(bound.unsigned_abs())
        } else {
            (bound as usize).min(len)
        }
    };
    let from = start.map_or(0, clamp);
    let to = end.map_or(len, clamp);
    if from >= to { from..from } else { from..to }
}

/// Outcome of [`PackCorrelationEngine::compute_range`].
#[derive(Debug, Default)]
pub struct RangeSummary {
    pub processed: usize,
    pub recorded: Vec<NaiveDate>,
    /// Days left without a record and why.
    pub skipped: Vec<(NaiveDate, PackError)>,
}

/// Result of looking up a single day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayCorrelation {
    Record(CorrelationRecord),
    NoValidData(NaiveDate),
}

impl fmt::Display for DayCorrelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayCorrelation::Record(r) => write!(
                f,
                "{}: average correlation {:.2}, beta {} ({:.2}), epsilon {} ({:.2}), sigma {} ({:.2}), omega {} ({:.2})",
                r.date,
                r.mean_corr,
                r.beta,
                r.beta_corr,
                r.epsilon,
                r.epsilon_corr,
                r.sigma,
                r.sigma_corr,
                r.omega,
                r.omega_corr
            ),
            DayCorrelation::NoValidData(date) => {
                write!(f, "{date} has no valid correlation data calculated")
            }
        }
    }
}

/// Normalized close paths for the members of one day's pack.
#[derive(Debug, Clone, PartialEq)]
pub struct PackPaths {
    pub date: NaiveDate,
    /// `(role, ticker, path)` for alpha, beta, epsilon, sigma and omega.
    pub members: Vec<(&'static str, Ticker, Vec<f64>)>,
}

/// Intraday close path: the day's bars minus the final bar.
fn day_path(bars: &[PriceBar], entry: &DayEntry) -> Vec<f64> {
    let end = entry.end.saturating_sub(1).max(entry.start);
    closes(&bars[entry.start..end])
}

pub struct PackCorrelationEngine<'a> {
    store: &'a TimeSeriesStore,
    alpha: Ticker,
    partial_day_tolerance: usize,
    table: CorrelationTable,
    distributions: DistributionStore,
}

impl<'a> PackCorrelationEngine<'a> {
    pub fn new(store: &'a TimeSeriesStore, alpha: &str) -> Result<Self, PackError> {
        let alpha = store.ticker(alpha)?.clone();
        Ok(Self {
            store,
            alpha,
            partial_day_tolerance: DEFAULT_PARTIAL_DAY_TOLERANCE,
            table: CorrelationTable::new(),
            distributions: DistributionStore::new(),
        })
    }

    pub fn with_partial_day_tolerance(mut self, bars: usize) -> Self {
        self.partial_day_tolerance = bars;
        self
    }

    pub fn store(&self) -> &'a TimeSeriesStore {
        self.store
    }

    pub fn alpha(&self) -> &Ticker {
        &self.alpha
    }

    /// Switches the reference ticker. Unknown tickers leave alpha unchanged.
    pub fn set_alpha(&mut self, ticker: &str) -> Result<(), PackError> {
        let alpha = match self.store.ticker(ticker) {
            Ok(t) => t.clone(),
            Err(e) => {
                warn!("{ticker} not in store, alpha stays {}", self.alpha);
                return Err(e);
            }
        };
        if alpha != self.alpha {
            self.alpha = alpha;
            self.table.clear();
            self.distributions.clear();
        }
        Ok(())
    }

    pub fn correlation_table(&self) -> &CorrelationTable {
        &self.table
    }

    pub fn distribution(&self, date: NaiveDate) -> Option<&[f64]> {
        self.distributions.get(date)
    }

    pub fn distributions(&self) -> &DistributionStore {
        &self.distributions
    }

    /// Computes alpha's days `[start, end)` with Python slice semantics.
    ///
    /// Days that cannot produce a record are logged and listed in the
    /// summary; they never stop the rest of the range.
    pub fn compute_range(
        &mut self,
        start: Option<isize>,
        end: Option<isize>,
    ) -> Result<RangeSummary, PackError> {
        let store = self.store;
        let entries = store.series(self.alpha.as_str())?.day_index().entries();
        let range = resolve_slice(entries.len(), start, end);

        let mut summary = RangeSummary::default();
        for entry in &entries[range] {
            summary.processed += 1;
            match self.compute_day(entry) {
                Ok(record) => {
                    summary.recorded.push(record.date);
                    self.table.upsert(record);
                }
                Err(e) if e.is_day_local() => {
                    debug!(date = %entry.date, alpha = %self.alpha, "skipping day: {e}");
                    summary.skipped.push((entry.date, e));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Correlations of every other ticker against alpha for one alpha day.
    ///
    /// Records the day's distribution before summarizing, so days without a
    /// record still have one.
    fn compute_day(&mut self, alpha_day: &DayEntry) -> Result<CorrelationRecord, PackError> {
        let date = alpha_day.date;
        let store = self.store;
        let alpha_bars = store.series(self.alpha.as_str())?.bars();

        let first = &alpha_bars[alpha_day.start];
        let last = &alpha_bars[alpha_day.end - 1];
        let alpha_gain = last.close / first.open;
        let alpha_path = day_path(alpha_bars, alpha_day);

        let mut correlations: Vec<(Ticker, Option<f64>)> = Vec::new();
        for (ticker, series) in store.iter() {
            if *ticker == self.alpha {
                continue;
            }
            let Some(entry) = series.day(date) else {
                continue;
            };
            let path = day_path(series.bars(), entry);
            if path.len().saturating_add(self.partial_day_tolerance) <= alpha_path.len() {
                debug!(%ticker, %date, bars = path.len(), alpha_bars = alpha_path.len(), "partial day");
                continue;
            }
            correlations.push((ticker.clone(), stats::pearson(&alpha_path, &path)));
        }

        let distribution: Vec<f64> = correlations.iter().filter_map(|(_, c)| *c).collect();
        self.distributions.insert(date, distribution);

        summarize_day(date, alpha_gain, &correlations)
    }

    /// Cached record for `date`, computing just that day if needed.
    pub fn correlation_for_date(&mut self, date: NaiveDate) -> Result<DayCorrelation, PackError> {
        if let Some(record) = self.table.get(date) {
            return Ok(DayCorrelation::Record(record.clone()));
        }

        let position = self
            .store
            .series(self.alpha.as_str())?
            .day_index()
            .position(date)
            .ok_or_else(|| PackError::NotFound {
                ticker: self.alpha.to_string(),
                date,
            })?;
        let i = position as isize;
        self.compute_range(Some(i), Some(i + 1))?;

        Ok(match self.table.get(date) {
            Some(record) => DayCorrelation::Record(record.clone()),
            None => DayCorrelation::NoValidData(date),
        })
    }

    /// Mean, median and modal-bin center of the day's distribution.
    pub fn histogram_stats(&self, date: NaiveDate, bins: usize) -> Result<HistogramStats, PackError> {
        let values = self
            .distributions
            .get(date)
            .ok_or_else(|| PackError::NotFound {
                ticker: self.alpha.to_string(),
                date,
            })?;
        HistogramStats::compute(date, values, bins)
    }

    /// Counts per bin for the distributions selected by a Python-style slice
    /// over processing order.
    pub fn correlation_heatmap_matrix(
        &self,
        start: Option<isize>,
        end: Option<isize>,
        bins: usize,
    ) -> Result<HeatmapMatrix, PackError> {
        if bins == 0 {
            return Err(PackError::InvalidArgument {
                reason: "heatmap needs at least one bin".into(),
            });
        }
        let range = resolve_slice(self.distributions.len(), start, end);
        let (days, counts): (Vec<NaiveDate>, Vec<Vec<u32>>) = self
            .distributions
            .iter()
            .skip(range.start)
            .take(range.len())
            .map(|(date, values)| (date, stats::histogram(values, bins)))
            .unzip();

        Ok(HeatmapMatrix {
            days,
            bin_centers: (0..bins).map(|i| stats::bin_center(i, bins)).collect(),
            counts,
        })
    }

    /// Min-max normalized close path of `ticker` on `date`, final bar excluded.
    pub fn normalized_path(&self, ticker: &str, date: NaiveDate) -> Result<Vec<f64>, PackError> {
        let series = self.store.series(ticker)?;
        let entry = series.day(date).ok_or_else(|| PackError::NotFound {
            ticker: ticker.to_string(),
            date,
        })?;
        let path = day_path(series.bars(), entry);

        let lo = path.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = path.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(hi > lo) {
            return Err(PackError::InsufficientData {
                date,
                samples: path.len(),
                minimum: 2,
            });
        }
        Ok(path.iter().map(|p| (p - lo) / (hi - lo)).collect())
    }

    /// Normalized paths of alpha and the day's extremal tickers.
    pub fn day_pack(&mut self, date: NaiveDate) -> Result<PackPaths, PackError> {
        let record = match self.correlation_for_date(date)? {
            DayCorrelation::Record(r) => r,
            DayCorrelation::NoValidData(date) => {
                return Err(PackError::NoValidCorrelation { date });
            }
        };

        let roles = [
            ("alpha", self.alpha.clone()),
            ("beta", record.beta),
            ("epsilon", record.epsilon),
            ("sigma", record.sigma),
            ("omega", record.omega),
        ];
        let mut members = Vec::with_capacity(roles.len());
        for (role, ticker) in roles {
            let path = self.normalized_path(ticker.as_str(), date)?;
            members.push((role, ticker, path));
        }
        Ok(PackPaths { date, members })
    }
}

impl fmt::Display for PackCorrelationEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self
            .store
            .series(self.alpha.as_str())
            .map_or(0, |s| s.day_index().len());
        write!(
            f,
            "Contains {} tickers with {} days and alpha as {}",
            self.store.len(),
            days,
            self.alpha
        )
    }
}
