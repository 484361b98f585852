//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for packcorr.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("unknown ticker: {ticker}")]
    UnknownTicker { ticker: String },

    #[error("invalid ticker symbol {symbol:?}: {reason}")]
    InvalidTicker { symbol: String, reason: String },

    #[error("no indexed day {date} for {ticker}")]
    NotFound { ticker: String, date: NaiveDate },

    #[error("insufficient data on {date}: have {samples} correlation samples, need {minimum}")]
    InsufficientData {
        date: NaiveDate,
        samples: usize,
        minimum: usize,
    },

    #[error("{date} has no valid correlation data calculated")]
    NoValidCorrelation { date: NaiveDate },

    #[error("no ticker correlation equals the median {median} on {date}")]
    AmbiguousExtremal { date: NaiveDate, median: f64 },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("state error: {reason}")]
    State { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PackError {
    /// Per-day outcomes that skip a day without aborting a range.
    pub fn is_day_local(&self) -> bool {
        matches!(
            self,
            PackError::InsufficientData { .. }
                | PackError::NoValidCorrelation { .. }
                | PackError::AmbiguousExtremal { .. }
        )
    }
}

impl From<&PackError> for std::process::ExitCode {
    fn from(err: &PackError) -> Self {
        let code: u8 = match err {
            PackError::Io(_) => 1,
            PackError::ConfigParse { .. }
            | PackError::ConfigMissing { .. }
            | PackError::ConfigInvalid { .. }
            | PackError::InvalidArgument { .. } => 2,
            PackError::Data { .. } | PackError::State { .. } => 3,
            PackError::UnknownTicker { .. }
            | PackError::InvalidTicker { .. }
            | PackError::NotFound { .. } => 4,
            PackError::InsufficientData { .. }
            | PackError::NoValidCorrelation { .. }
            | PackError::AmbiguousExtremal { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
