//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{load_watchlist, CsvAdapter};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_state_adapter::JsonStateAdapter;
use crate::domain::config::{build_analysis_config, AnalysisConfig};
use crate::domain::coverage::CoverageReport;
use crate::domain::engine::{DayCorrelation, PackCorrelationEngine, RangeSummary};
use crate::domain::error::PackError;
use crate::domain::store::TimeSeriesStore;
use crate::domain::ticker::Ticker;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::state_port::StatePort;

#[derive(Parser, Debug)]
#[command(name = "packcorr", about = "Intraday pack correlation analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Reference ticker, overriding [analysis] alpha
    #[arg(long)]
    pub alpha: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load minute-bar CSVs into the store and save its state
    Ingest {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Compute daily correlations against alpha and write the table
    Correlate {
        #[command(flatten)]
        common: CommonArgs,
        /// First day index (negative counts from the latest day)
        #[arg(long, allow_negative_numbers = true)]
        start: Option<isize>,
        #[arg(long, allow_negative_numbers = true)]
        end: Option<isize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show one day's record and its pack
    Day {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Summarize one day's correlation distribution
    Histogram {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Write the day-by-bin correlation heatmap
    Heatmap {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        bins: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report missing weekdays and short sessions
    Verify {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Also count missing minutes per day
        #[arg(long)]
        minutes: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Dispatches a parsed command line.
pub fn execute(cli: Cli) -> Result<(), PackError> {
    match cli.command {
        Command::Ingest { common } => run_ingest(&common),
        Command::Correlate {
            common,
            start,
            end,
            output,
        } => run_correlate(&common, start, end, output),
        Command::Day { common, date } => run_day(&common, date),
        Command::Histogram { common, date, bins } => run_histogram(&common, date, bins),
        Command::Heatmap {
            common,
            bins,
            output,
        } => run_heatmap(&common, bins, output),
        Command::Verify {
            common,
            start,
            end,
            minutes,
        } => run_verify(&common, start, end, minutes),
    }
}

/// Reads the INI file and applies command-line overrides.
pub fn load_config(common: &CommonArgs) -> Result<AnalysisConfig, PackError> {
    eprintln!("Loading config from {}", common.config.display());
    let adapter = FileConfigAdapter::from_file(&common.config)?;
    let mut config = build_analysis_config(&adapter)?;
    if let Some(alpha) = &common.alpha {
        config.alpha = Ticker::new(alpha)?;
    }
    Ok(config)
}

/// Tickers to load: the watchlist plus alpha.
pub fn resolve_tickers(config: &AnalysisConfig) -> Result<Vec<Ticker>, PackError> {
    let mut tickers = BTreeSet::new();
    for symbol in load_watchlist(config.watchlist.as_deref())? {
        tickers.insert(Ticker::new(&symbol)?);
    }
    tickers.insert(config.alpha.clone());
    Ok(tickers.into_iter().collect())
}

/// Restores saved state, then ingests whatever the data port has beyond it.
///
/// Each ticker is fetched from its last stored day onward; bars already in
/// the store are dropped as duplicates.
pub fn load_store(
    config: &AnalysisConfig,
    data_port: &dyn DataPort,
    state_port: Option<&dyn StatePort>,
) -> Result<TimeSeriesStore, PackError> {
    let mut store = match state_port.map(|p| p.load()).transpose()?.flatten() {
        Some(state) => TimeSeriesStore::import_state(state)?,
        None => TimeSeriesStore::new(),
    };

    let available: BTreeSet<String> = data_port.list_tickers()?.into_iter().collect();
    for ticker in resolve_tickers(config)? {
        if !available.contains(ticker.as_str()) {
            warn!(%ticker, "no minute data available, skipping");
            continue;
        }
        let from = store
            .series(ticker.as_str())
            .ok()
            .and_then(|s| s.day_index().last())
            .map_or(NaiveDate::MIN, |e| e.date);
        let bars = data_port.fetch_minute_bars(ticker.as_str(), from, NaiveDate::MAX)?;
        let summary = store.ingest(ticker.as_str(), bars)?;
        if summary.added > 0 {
            eprintln!(
                "{ticker}: {} new bars, {} new days",
                summary.added, summary.days_added
            );
        }
    }

    info!(tickers = store.len(), "store ready");
    Ok(store)
}

fn state_adapter(config: &AnalysisConfig) -> Option<JsonStateAdapter> {
    config.state_file.clone().map(JsonStateAdapter::new)
}

fn open_store(config: &AnalysisConfig) -> Result<TimeSeriesStore, PackError> {
    let data = CsvAdapter::new(config.data_dir.clone());
    let state = state_adapter(config);
    load_store(config, &data, state.as_ref().map(|s| s as &dyn StatePort))
}

fn build_engine<'a>(
    config: &AnalysisConfig,
    store: &'a TimeSeriesStore,
) -> Result<PackCorrelationEngine<'a>, PackError> {
    Ok(PackCorrelationEngine::new(store, config.alpha.as_str())?
        .with_partial_day_tolerance(config.partial_day_tolerance))
}

fn run_ingest(common: &CommonArgs) -> Result<(), PackError> {
    let config = load_config(common)?;
    let store = open_store(&config)?;

    for (ticker, series) in store.iter() {
        let index = series.day_index();
        match (index.first(), index.last()) {
            (Some(first), Some(last)) => println!(
                "{ticker}: {} bars over {} days, {} to {}",
                series.len(),
                index.len(),
                first.date,
                last.date
            ),
            _ => println!("{ticker}: no data"),
        }
    }

    match state_adapter(&config) {
        Some(port) => port.save(&store.export_state())?,
        None => eprintln!("No [data] state_file configured; state not saved"),
    }
    Ok(())
}

/// Computes `[start, end)` of alpha's days and writes the table through
/// `report_port`.
pub fn run_correlation_pipeline(
    engine: &mut PackCorrelationEngine<'_>,
    start: Option<isize>,
    end: Option<isize>,
    report_port: &dyn ReportPort,
    output: &Path,
) -> Result<RangeSummary, PackError> {
    let summary = engine.compute_range(start, end)?;
    let table = engine.correlation_table();

    for date in &summary.recorded {
        if let Some(record) = table.get(*date) {
            println!("{}", DayCorrelation::Record(record.clone()));
        }
    }
    for (date, reason) in &summary.skipped {
        eprintln!("Skipped {date}: {reason}");
    }

    let (window, rolling) = table.rolling_mean();
    if let Some(latest) = rolling.last().copied().flatten() {
        eprintln!("Rolling mean correlation ({window}-day window): {latest:.3}");
    }

    report_port.write_table(table, output)?;
    eprintln!(
        "{}: {} of {} days recorded, table written to {}",
        engine,
        summary.recorded.len(),
        summary.processed,
        output.display()
    );
    Ok(summary)
}

fn run_correlate(
    common: &CommonArgs,
    start: Option<isize>,
    end: Option<isize>,
    output: Option<PathBuf>,
) -> Result<(), PackError> {
    let config = load_config(common)?;
    let store = open_store(&config)?;
    let mut engine = build_engine(&config, &store)?;

    let output = output.unwrap_or_else(|| config.output.clone());
    run_correlation_pipeline(
        &mut engine,
        start.or(config.start_index),
        end.or(config.end_index),
        &CsvReportAdapter,
        &output,
    )?;
    Ok(())
}

fn run_day(common: &CommonArgs, date: NaiveDate) -> Result<(), PackError> {
    let config = load_config(common)?;
    let store = open_store(&config)?;
    let mut engine = build_engine(&config, &store)?;

    let outcome = engine.correlation_for_date(date)?;
    println!("{outcome}");
    if let DayCorrelation::Record(_) = outcome {
        let pack = engine.day_pack(date)?;
        for (role, ticker, path) in &pack.members {
            let last = path.last().copied().unwrap_or(f64::NAN);
            println!("  {role:<8}{ticker:<8}{} points, closing at {last:.3}", path.len());
        }
    }
    Ok(())
}

fn run_histogram(common: &CommonArgs, date: NaiveDate, bins: Option<usize>) -> Result<(), PackError> {
    let config = load_config(common)?;
    let store = open_store(&config)?;
    let mut engine = build_engine(&config, &store)?;

    // Computing the day records its distribution even without a record.
    engine.correlation_for_date(date)?;
    let stats = engine.histogram_stats(date, bins.unwrap_or(config.histogram_bins))?;
    println!(
        "{date}: mean {:.4}, median {:.4}, mode {:.4}",
        stats.mean, stats.median, stats.mode
    );
    Ok(())
}

fn run_heatmap(
    common: &CommonArgs,
    bins: Option<usize>,
    output: Option<PathBuf>,
) -> Result<(), PackError> {
    let config = load_config(common)?;
    let store = open_store(&config)?;
    let mut engine = build_engine(&config, &store)?;

    engine.compute_range(config.start_index, config.end_index)?;
    let heatmap =
        engine.correlation_heatmap_matrix(None, None, bins.unwrap_or(config.histogram_bins))?;

    let output = output.unwrap_or_else(|| config.heatmap_output.clone());
    CsvReportAdapter.write_heatmap(&heatmap, &output)?;
    eprintln!(
        "Heatmap of {} days x {} bins written to {}",
        heatmap.days.len(),
        heatmap.bins(),
        output.display()
    );
    Ok(())
}

/// Prints a coverage report; returns whether it found no gaps.
pub fn print_coverage(report: &CoverageReport) -> bool {
    for (ticker, days) in &report.missing_days {
        let listed: Vec<String> = days.iter().map(NaiveDate::to_string).collect();
        println!("{ticker}: {} mismatched days: {}", days.len(), listed.join(", "));
    }
    for (ticker, days) in &report.missing_minutes {
        for (date, missing) in days {
            println!("{ticker} {date}: {missing} minutes missing");
        }
    }
    report.is_clean()
}

fn run_verify(
    common: &CommonArgs,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    minutes: bool,
) -> Result<(), PackError> {
    let config = load_config(common)?;
    let store = open_store(&config)?;

    let start = start.or(config.verify_start);
    let end = end.or(config.verify_end);
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(PackError::InvalidArgument {
                reason: format!("--end {e} precedes --start {s}"),
            });
        }
    }

    let report = store.verify_coverage(start, end, minutes || config.minute_check);
    if print_coverage(&report) {
        eprintln!("Coverage complete for {} tickers", store.len());
    }
    Ok(())
}
