//! Minute-bar CSV data adapter.
//!
//! One file per ticker, `<dir>/<TICKER>-1m.csv`, with the columns
//! `Datetime,Open,High,Low,Close,Adj Close,Volume`.

use crate::domain::bar::PriceBar;
use crate::domain::error::PackError;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const FILE_SUFFIX: &str = "-1m.csv";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Tickers used when no watchlist file is configured.
pub const DEFAULT_WATCHLIST: [&str; 4] = ["SPY", "QQQ", "DIA", "UVXY"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    datetime: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: usize,
    volume: usize,
}

impl Columns {
    /// Named columns where present, positional defaults otherwise.
    ///
    /// Files whose first header cell is blank or unnamed still carry the
    /// timestamp in column 0.
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str, default: usize| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .unwrap_or(default)
        };
        Self {
            datetime: find("Datetime", 0),
            open: find("Open", 1),
            high: find("High", 2),
            low: find("Low", 3),
            close: find("Close", 4),
            adj_close: find("Adj Close", 5),
            volume: find("Volume", 6),
        }
    }
}

fn data_error(path: &Path, line: u64, reason: impl std::fmt::Display) -> PackError {
    PackError::Data {
        reason: format!("{}:{}: {}", path.display(), line, reason),
    }
}

/// Minute timestamp from the first 16 characters, dropping seconds and any
/// UTC offset.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let head = raw.trim().get(..16)?;
    NaiveDateTime::parse_from_str(head, DATETIME_FORMAT).ok()
}

fn parse_price(raw: Option<&str>) -> Result<f64, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(f64::NAN),
        Some(v) => v.parse().map_err(|e| format!("invalid price {v:?}: {e}")),
    }
}

fn parse_volume(raw: Option<&str>) -> Result<i64, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(v) => v
            .parse::<i64>()
            .or_else(|_| v.parse::<f64>().map(|f| f as i64))
            .map_err(|e| format!("invalid volume {v:?}: {e}")),
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}{FILE_SUFFIX}"))
    }

    fn read_bars(&self, path: &Path) -> Result<Vec<PriceBar>, PackError> {
        let content = fs::read_to_string(path).map_err(|e| PackError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(path, 1, format!("CSV header error: {e}")))?
            .clone();
        let cols = Columns::from_headers(&headers);

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| PackError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let raw = record
                .get(cols.datetime)
                .ok_or_else(|| data_error(path, line, "missing datetime column"))?;
            let timestamp = parse_timestamp(raw)
                .ok_or_else(|| data_error(path, line, format!("invalid datetime {raw:?}")))?;

            let price = |i: usize| parse_price(record.get(i)).map_err(|e| data_error(path, line, e));
            bars.push(PriceBar {
                timestamp,
                open: price(cols.open)?,
                high: price(cols.high)?,
                low: price(cols.low)?,
                close: price(cols.close)?,
                adj_close: price(cols.adj_close)?,
                volume: parse_volume(record.get(cols.volume))
                    .map_err(|e| data_error(path, line, e))?,
            });
        }
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_minute_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, PackError> {
        let mut bars = self.read_bars(&self.csv_path(ticker))?;
        bars.retain(|b| (start_date..=end_date).contains(&b.date()));
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, PackError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PackError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PackError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(FILE_SUFFIX) {
                if !ticker.is_empty() {
                    tickers.push(ticker.to_string());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

/// Tickers from the first column of each row of `path`, sorted.
///
/// Without a path, [`DEFAULT_WATCHLIST`].
pub fn load_watchlist(path: Option<&Path>) -> Result<Vec<String>, PackError> {
    let Some(path) = path else {
        return Ok(DEFAULT_WATCHLIST.iter().map(|t| t.to_string()).collect());
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PackError::Data {
            reason: format!("failed to read watchlist {}: {}", path.display(), e),
        })?;

    let mut tickers = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| PackError::Data {
            reason: format!("watchlist parse error in {}: {}", path.display(), e),
        })?;
        if let Some(first) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) {
            tickers.push(first.to_string());
        }
    }
    tickers.sort();
    Ok(tickers)
}
