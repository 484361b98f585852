//! Minute price bar representation.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One minute of trading. Missing prices are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    #[serde(with = "nan_as_null")]
    pub open: f64,
    #[serde(with = "nan_as_null")]
    pub high: f64,
    #[serde(with = "nan_as_null")]
    pub low: f64,
    #[serde(with = "nan_as_null")]
    pub close: f64,
    #[serde(with = "nan_as_null")]
    pub adj_close: f64,
    pub volume: i64,
}

/// JSON has no NaN; missing prices travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

impl PriceBar {
    /// Calendar date of the bar, ignoring time of day.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Close prices of a bar slice.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
