#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use packcorr::domain::error::PackError;
pub use packcorr::domain::bar::PriceBar;
use packcorr::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.entry(ticker.to_string()).or_default().extend(bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.data.entry(ticker.to_string()).or_default();
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_minute_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, PackError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PackError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date() >= start_date && b.date() <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, PackError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per minute from 09:30 with the given closes. Every bar opens at
/// the day's first close.
pub fn day_bars(day: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    let open = NaiveDateTime::new(day, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: open + Duration::minutes(i as i64),
            open: closes[0],
            high: close + 0.05,
            low: close - 0.05,
            close,
            adj_close: close,
            volume: 1_000 + i as i64,
        })
        .collect()
}

/// Deterministic zig-zag trending path; `seed` varies shape.
pub fn path(n: usize, seed: u32, drift: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let wobble = ((i as u32 * 7 + seed * 13) % 11) as f64 / 10.0;
            100.0 + drift * i as f64 + wobble
        })
        .collect()
}

pub fn scaled(values: &[f64], factor: f64, offset: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor + offset).collect()
}

/// Consecutive weekdays starting at `start`.
pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    use chrono::{Datelike, Weekday};
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

pub fn csv_text(bars: &[PriceBar]) -> String {
    let mut out = String::from("Datetime,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        out.push_str(&format!(
            "{}:00-05:00,{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.adj_close,
            b.volume
        ));
    }
    out
}
