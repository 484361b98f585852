//! Validated ticker symbols.

use crate::domain::error::PackError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Upper-cased, trimmed ticker symbol.
///
/// Ordering is lexicographic, which is the iteration order of the store and
/// therefore the tie-break order for extremal ticker selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: &str) -> Result<Self, PackError> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(PackError::InvalidTicker {
                symbol: symbol.to_string(),
                reason: "symbol is empty".into(),
            });
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, ',' | '/' | '\\'))
        {
            return Err(PackError::InvalidTicker {
                symbol: symbol.to_string(),
                reason: format!("symbol contains {c:?}"),
            });
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ticker::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = PackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let t = Ticker::new("  spy ").unwrap();
        assert_eq!(t.as_str(), "SPY");
        assert_eq!(t.to_string(), "SPY");
    }

    #[test]
    fn rejects_empty() {
        assert!(Ticker::new("").is_err());
        assert!(Ticker::new("   ").is_err());
    }

    #[test]
    fn rejects_separators() {
        assert!(Ticker::new("BRK B").is_err());
        assert!(Ticker::new("SPY,QQQ").is_err());
        assert!(Ticker::new("../etc").is_err());
    }

    #[test]
    fn allows_punctuation_used_by_symbols() {
        assert_eq!(Ticker::new("brk-b").unwrap().as_str(), "BRK-B");
        assert_eq!(Ticker::new("^vix").unwrap().as_str(), "^VIX");
    }

    #[test]
    fn orders_alphabetically() {
        let mut tickers = vec![
            Ticker::new("QQQ").unwrap(),
            Ticker::new("DIA").unwrap(),
            Ticker::new("SPY").unwrap(),
        ];
        tickers.sort();
        let names: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["DIA", "QQQ", "SPY"]);
    }

    #[test]
    fn serde_round_trips_through_string() {
        let t = Ticker::new("uvxy").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"UVXY\"");
        let back: Ticker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<Ticker>("\"\"").is_err());
    }
}
