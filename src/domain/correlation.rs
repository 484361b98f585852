//! Per-day correlation records and the caches built from them.

use crate::domain::error::PackError;
use crate::domain::stats;
use crate::domain::ticker::Ticker;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Summary of one day's cross-sectional correlation against alpha.
///
/// Beta is the most correlated ticker, epsilon the median one, sigma the
/// least correlated in absolute terms and omega the most anti-correlated.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRecord {
    pub date: NaiveDate,
    pub mean_corr: f64,
    pub directional_corr: f64,
    pub median_corr: f64,
    pub stdev_corr: f64,
    pub alpha_gain: f64,
    pub beta: Ticker,
    pub beta_corr: f64,
    pub epsilon: Ticker,
    pub epsilon_corr: f64,
    pub sigma: Ticker,
    pub sigma_corr: f64,
    pub omega: Ticker,
    pub omega_corr: f64,
}

/// +1 when alpha closed above its open, otherwise -1.
pub fn direction(alpha_gain: f64) -> f64 {
    if alpha_gain > 1.0 { 1.0 } else { -1.0 }
}

/// Mean correlation signed by alpha's direction; non-positive means are
/// zeroed, not flipped.
pub fn directional_corr(mean_corr: f64, alpha_gain: f64) -> f64 {
    if mean_corr > 0.0 {
        mean_corr * direction(alpha_gain)
    } else {
        0.0
    }
}

/// First entry whose key is strictly greater than every earlier one.
fn first_max_by<'a, I, F>(entries: I, key: F) -> Option<(&'a Ticker, f64)>
where
    I: Iterator<Item = (&'a Ticker, f64)>,
    F: Fn(f64) -> f64,
{
    let mut best: Option<(&Ticker, f64)> = None;
    for (ticker, corr) in entries {
        match best {
            Some((_, b)) if key(corr) <= key(b) => {}
            _ => best = Some((ticker, corr)),
        }
    }
    best
}

/// Builds the record for one day from per-ticker correlations.
///
/// `correlations` is in ticker iteration order; `None` marks an undefined
/// correlation and is left out of every statistic and extremal search. Ties
/// go to the earliest ticker.
pub fn summarize_day(
    date: NaiveDate,
    alpha_gain: f64,
    correlations: &[(Ticker, Option<f64>)],
) -> Result<CorrelationRecord, PackError> {
    let defined: Vec<(&Ticker, f64)> = correlations
        .iter()
        .filter_map(|(t, c)| c.map(|c| (t, c)))
        .collect();
    let values: Vec<f64> = defined.iter().map(|(_, c)| *c).collect();

    if values.is_empty() {
        return Err(PackError::NoValidCorrelation { date });
    }
    let stdev_corr = stats::sample_stdev(&values).ok_or(PackError::InsufficientData {
        date,
        samples: values.len(),
        minimum: 2,
    })?;
    let mean_corr = stats::mean(&values)
        .filter(|m| m.is_finite())
        .ok_or(PackError::NoValidCorrelation { date })?;
    let median_corr = stats::median_high(&values).ok_or(PackError::NoValidCorrelation { date })?;

    let (beta, beta_corr) = first_max_by(defined.iter().copied(), |c| c)
        .ok_or(PackError::NoValidCorrelation { date })?;
    let (omega, omega_corr) = first_max_by(defined.iter().copied(), |c| -c)
        .ok_or(PackError::NoValidCorrelation { date })?;
    let (sigma, sigma_corr) = first_max_by(
        defined.iter().copied().filter(|(_, c)| *c != 0.0),
        |c| -c.abs(),
    )
    .ok_or(PackError::NoValidCorrelation { date })?;
    let (epsilon, epsilon_corr) = defined
        .iter()
        .copied()
        .find(|(_, c)| *c == median_corr)
        .ok_or(PackError::AmbiguousExtremal {
            date,
            median: median_corr,
        })?;

    Ok(CorrelationRecord {
        date,
        mean_corr,
        directional_corr: directional_corr(mean_corr, alpha_gain),
        median_corr,
        stdev_corr,
        alpha_gain,
        beta: beta.clone(),
        beta_corr,
        epsilon: epsilon.clone(),
        epsilon_corr,
        sigma: sigma.clone(),
        sigma_corr,
        omega: omega.clone(),
        omega_corr,
    })
}

/// Records in processing order, looked up by date.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    records: Vec<CorrelationRecord>,
    by_date: HashMap<NaiveDate, usize>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record`, or replaces the existing record for its date in place.
    pub fn upsert(&mut self, record: CorrelationRecord) {
        match self.by_date.get(&record.date) {
            Some(&i) => self.records[i] = record,
            None => {
                self.by_date.insert(record.date, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CorrelationRecord> {
        self.by_date.get(&date).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[CorrelationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.by_date.clear();
    }

    pub fn mean_corrs(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.mean_corr).collect()
    }

    /// Rolling mean of `mean_corr`, window sized by table length.
    pub fn rolling_mean(&self) -> (usize, Vec<Option<f64>>) {
        let window = stats::rolling_window_for(self.records.len());
        (window, stats::rolling_mean(&self.mean_corrs(), window))
    }
}

/// Date → defined per-ticker correlations, in processing order.
#[derive(Debug, Clone, Default)]
pub struct DistributionStore {
    order: Vec<NaiveDate>,
    values: HashMap<NaiveDate, Vec<f64>>,
}

impl DistributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `values` for `date`; a recomputed day keeps its position.
    pub fn insert(&mut self, date: NaiveDate, values: Vec<f64>) {
        if self.values.insert(date, values).is_none() {
            self.order.push(date);
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&[f64]> {
        self.values.get(&date).map(Vec::as_slice)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[f64])> {
        self.order
            .iter()
            .map(|d| (*d, self.values.get(d).map_or(&[][..], Vec::as_slice)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.values.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    pub mean: f64,
    pub median: f64,
    /// Center of the most populated bin; the lowest such bin on ties.
    pub mode: f64,
}

impl HistogramStats {
    pub fn compute(date: NaiveDate, values: &[f64], bins: usize) -> Result<Self, PackError> {
        if bins == 0 {
            return Err(PackError::InvalidArgument {
                reason: "histogram needs at least one bin".into(),
            });
        }
        let insufficient = || PackError::InsufficientData {
            date,
            samples: values.len(),
            minimum: 1,
        };
        let mean = stats::mean(values).ok_or_else(insufficient)?;
        let median = stats::median(values).ok_or_else(insufficient)?;

        let counts = stats::histogram(values, bins);
        let modal = counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best })
            .0;

        Ok(Self {
            mean,
            median,
            mode: stats::bin_center(modal, bins),
        })
    }
}

/// Day × bin correlation counts over `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapMatrix {
    pub days: Vec<NaiveDate>,
    pub bin_centers: Vec<f64>,
    /// `counts[day][bin]`.
    pub counts: Vec<Vec<u32>>,
}

impl HeatmapMatrix {
    pub fn bins(&self) -> usize {
        self.bin_centers.len()
    }
}
