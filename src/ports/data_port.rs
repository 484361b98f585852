//! Minute-bar data access port trait.

use crate::domain::bar::PriceBar;
use crate::domain::error::PackError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` whose calendar date falls in `[start_date, end_date]`.
    fn fetch_minute_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, PackError>;

    fn list_tickers(&self) -> Result<Vec<String>, PackError>;
}
