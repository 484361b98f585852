//! Analysis configuration and its validation.
//!
//! Sections: `[data]`, `[analysis]`, `[verify]`, `[report]`.

use crate::domain::engine::DEFAULT_PARTIAL_DAY_TOLERANCE;
use crate::domain::error::PackError;
use crate::domain::ticker::Ticker;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_HISTOGRAM_BINS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub state_file: Option<PathBuf>,
    pub watchlist: Option<PathBuf>,
    pub alpha: Ticker,
    pub partial_day_tolerance: usize,
    pub histogram_bins: usize,
    pub start_index: Option<isize>,
    pub end_index: Option<isize>,
    pub verify_start: Option<NaiveDate>,
    pub verify_end: Option<NaiveDate>,
    pub minute_check: bool,
    pub output: PathBuf,
    pub heatmap_output: PathBuf,
}

fn missing(section: &str, key: &str) -> PackError {
    PackError::ConfigMissing {
        section: section.into(),
        key: key.into(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PackError {
    PackError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

fn non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, PackError> {
    let Some(raw) = config.get_nonempty(section, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<i64>()
        .map_err(|_| invalid(section, key, format!("{raw:?} is not an integer")))?;
    usize::try_from(value)
        .map_err(|_| invalid(section, key, format!("{key} must be non-negative")))
}

fn optional_index(config: &dyn ConfigPort, key: &str) -> Result<Option<isize>, PackError> {
    config
        .get_nonempty("analysis", key)
        .map(|raw| {
            raw.parse::<isize>()
                .map_err(|_| invalid("analysis", key, format!("{raw:?} is not an integer")))
        })
        .transpose()
}

fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, PackError> {
    config
        .get_date(section, key)
        .transpose()
        .map_err(|_| invalid(section, key, "invalid date format (expected YYYY-MM-DD)"))
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, PackError> {
    let data_dir = config
        .get_nonempty("data", "dir")
        .map(PathBuf::from)
        .ok_or_else(|| missing("data", "dir"))?;

    let alpha_raw = config
        .get_nonempty("analysis", "alpha")
        .ok_or_else(|| missing("analysis", "alpha"))?;
    let alpha =
        Ticker::new(&alpha_raw).map_err(|e| invalid("analysis", "alpha", e.to_string()))?;

    let histogram_bins =
        non_negative(config, "analysis", "histogram_bins", DEFAULT_HISTOGRAM_BINS)?;
    if histogram_bins == 0 {
        return Err(invalid(
            "analysis",
            "histogram_bins",
            "histogram_bins must be positive",
        ));
    }

    let verify_start = optional_date(config, "verify", "start_date")?;
    let verify_end = optional_date(config, "verify", "end_date")?;
    if let (Some(s), Some(e)) = (verify_start, verify_end) {
        if s > e {
            return Err(invalid(
                "verify",
                "end_date",
                "end_date must not precede start_date",
            ));
        }
    }

    Ok(AnalysisConfig {
        data_dir,
        state_file: config.get_nonempty("data", "state_file").map(PathBuf::from),
        watchlist: config.get_nonempty("data", "watchlist").map(PathBuf::from),
        alpha,
        partial_day_tolerance: non_negative(
            config,
            "analysis",
            "partial_day_tolerance",
            DEFAULT_PARTIAL_DAY_TOLERANCE,
        )?,
        histogram_bins,
        start_index: optional_index(config, "start_index")?,
        end_index: optional_index(config, "end_index")?,
        verify_start,
        verify_end,
        minute_check: config.get_bool("verify", "minute_check", false),
        output: config
            .get_nonempty("report", "output")
            .map_or_else(|| PathBuf::from("correlation.csv"), PathBuf::from),
        heatmap_output: config
            .get_nonempty("report", "heatmap_output")
            .map_or_else(|| PathBuf::from("heatmap.csv"), PathBuf::from),
    })
}
