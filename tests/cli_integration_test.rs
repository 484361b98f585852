//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading with command-line overrides
//! - Ticker resolution from the watchlist
//! - Store loading through a MockDataPort and saved state
//! - The correlation pipeline writing its table
//! - Every subcommand end to end over CSV files on disk

mod common;

use clap::Parser;
use common::*;
use packcorr::adapters::csv_report_adapter::CsvReportAdapter;
use packcorr::adapters::json_state_adapter::JsonStateAdapter;
use packcorr::cli::{self, Cli, Command, CommonArgs};
use packcorr::domain::config::AnalysisConfig;
use packcorr::domain::engine::PackCorrelationEngine;
use packcorr::domain::error::PackError;
use packcorr::domain::ticker::Ticker;
use packcorr::ports::state_port::StatePort;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BARS_PER_DAY: usize = 40;

fn analysis_config(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: dir.to_path_buf(),
        state_file: None,
        watchlist: None,
        alpha: Ticker::new("SPY").unwrap(),
        partial_day_tolerance: 10,
        histogram_bins: 20,
        start_index: None,
        end_index: None,
        verify_start: None,
        verify_end: None,
        minute_check: false,
        output: dir.join("correlation.csv"),
        heatmap_output: dir.join("heatmap.csv"),
    }
}

/// Closes for the default watchlist on day `k`.
fn pack_paths(k: usize) -> Vec<(&'static str, Vec<f64>)> {
    let alpha = path(BARS_PER_DAY, k as u32 + 1, 0.1);
    let follower: Vec<f64> = alpha
        .iter()
        .zip(path(BARS_PER_DAY, k as u32 + 4, 0.0))
        .map(|(a, n)| a + n)
        .collect();
    vec![
        ("QQQ", scaled(&alpha, 1.2, 3.0)),
        ("DIA", follower),
        ("UVXY", scaled(&alpha, -0.5, 90.0)),
        ("SPY", alpha),
    ]
}

fn mock_port(days: &[chrono::NaiveDate]) -> MockDataPort {
    let mut mock = MockDataPort::new();
    for (k, &d) in days.iter().enumerate() {
        for (ticker, closes) in pack_paths(k) {
            mock = mock.with_bars(ticker, day_bars(d, &closes));
        }
    }
    mock
}

/// Data directory with one CSV per default watchlist ticker, and an INI
/// pointing at it.
struct Workspace {
    dir: TempDir,
    days: Vec<chrono::NaiveDate>,
}

impl Workspace {
    fn new(day_count: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let days = weekdays(date(2024, 1, 2), day_count);
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();

        let mock = mock_port(&days);
        for (ticker, bars) in &mock.data {
            fs::write(data.join(format!("{ticker}-1m.csv")), csv_text(bars)).unwrap();
        }

        let ini = format!(
            "[data]\ndir = {data}\nstate_file = {state}\n\n\
             [analysis]\nalpha = SPY\nhistogram_bins = 20\n\n\
             [report]\noutput = {out}\nheatmap_output = {heat}\n",
            data = data.display(),
            state = dir.path().join("state.json").display(),
            out = dir.path().join("reports").join("corr.csv").display(),
            heat = dir.path().join("reports").join("heat.csv").display(),
        );
        fs::write(dir.path().join("packcorr.ini"), ini).unwrap();
        Self { dir, days }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Result<(), PackError> {
        let config = self.path("packcorr.ini");
        let mut argv = vec!["packcorr".to_string(), args[0].to_string()];
        argv.push("-c".into());
        argv.push(config.display().to_string());
        argv.extend(args[1..].iter().map(|a| a.to_string()));
        cli::execute(Cli::try_parse_from(argv).unwrap())
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn alpha_override_replaces_configured_alpha() {
        let ws = Workspace::new(1);
        let common = CommonArgs {
            config: ws.path("packcorr.ini"),
            alpha: Some("qqq".into()),
        };
        let config = cli::load_config(&common).unwrap();
        assert_eq!(config.alpha.as_str(), "QQQ");
        assert_eq!(config.histogram_bins, 20);
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let common = CommonArgs {
            config: PathBuf::from("/nonexistent/packcorr.ini"),
            alpha: None,
        };
        assert!(matches!(
            cli::load_config(&common),
            Err(PackError::ConfigParse { .. })
        ));
    }

    #[test]
    fn negative_indices_parse() {
        let cli = Cli::try_parse_from([
            "packcorr", "correlate", "-c", "x.ini", "--start", "-5", "--end", "-1",
        ])
        .unwrap();
        match cli.command {
            Command::Correlate { start, end, .. } => {
                assert_eq!(start, Some(-5));
                assert_eq!(end, Some(-1));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

mod ticker_resolution {
    use super::*;

    #[test]
    fn default_watchlist_plus_alpha() {
        let dir = TempDir::new().unwrap();
        let mut config = analysis_config(dir.path());
        config.alpha = Ticker::new("IWM").unwrap();

        let tickers: Vec<String> = cli::resolve_tickers(&config)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tickers, vec!["DIA", "IWM", "QQQ", "SPY", "UVXY"]);
    }

    #[test]
    fn watchlist_file_replaces_default() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("watch.csv");
        fs::write(&list, "qqq\nDIA,Dow\n").unwrap();
        let mut config = analysis_config(dir.path());
        config.watchlist = Some(list);

        let tickers: Vec<String> = cli::resolve_tickers(&config)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tickers, vec!["DIA", "QQQ", "SPY"]);
    }
}

mod store_loading {
    use super::*;

    #[test]
    fn skips_tickers_without_data() {
        let dir = TempDir::new().unwrap();
        let days = weekdays(date(2024, 1, 2), 2);
        let mut mock = mock_port(&days);
        mock.data.remove("UVXY");

        let store = cli::load_store(&analysis_config(dir.path()), &mock, None).unwrap();
        let tickers: Vec<&str> = store.tickers().map(|t| t.as_str()).collect();
        assert_eq!(tickers, vec!["DIA", "QQQ", "SPY"]);
        assert_eq!(store.series("SPY").unwrap().day_index().len(), 2);
    }

    #[test]
    fn fetch_error_propagates() {
        let dir = TempDir::new().unwrap();
        let days = weekdays(date(2024, 1, 2), 1);
        let mock = mock_port(&days).with_error("DIA", "disk on fire");

        let err = cli::load_store(&analysis_config(dir.path()), &mock, None).unwrap_err();
        assert!(matches!(err, PackError::Data { ref reason } if reason == "disk on fire"));
    }

    #[test]
    fn resumes_from_saved_state() {
        let dir = TempDir::new().unwrap();
        let days = weekdays(date(2024, 1, 2), 3);
        let config = analysis_config(dir.path());
        let state = JsonStateAdapter::new(dir.path().join("state.json"));

        let early = cli::load_store(&config, &mock_port(&days[..2]), None).unwrap();
        state.save(&early.export_state()).unwrap();

        let resumed = cli::load_store(&config, &mock_port(&days), Some(&state)).unwrap();
        let fresh = cli::load_store(&config, &mock_port(&days), None).unwrap();
        assert_eq!(resumed.export_state(), fresh.export_state());
        assert_eq!(resumed.series("QQQ").unwrap().len(), 3 * BARS_PER_DAY);
    }
}

mod pipeline_mock {
    use super::*;

    #[test]
    fn pipeline_writes_one_row_per_recorded_day() {
        let dir = TempDir::new().unwrap();
        let days = weekdays(date(2024, 1, 2), 3);
        let store = cli::load_store(&analysis_config(dir.path()), &mock_port(&days), None).unwrap();
        let mut engine = PackCorrelationEngine::new(&store, "SPY").unwrap();

        let output = dir.path().join("out").join("corr.csv");
        let summary =
            cli::run_correlation_pipeline(&mut engine, None, None, &CsvReportAdapter, &output)
                .unwrap();

        assert_eq!(summary.recorded, days);
        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("date,mean_corr"));
        for (line, d) in lines[1..].iter().zip(&days) {
            assert!(line.starts_with(&d.to_string()));
            assert!(line.contains(",QQQ,"), "beta should be QQQ: {line}");
            assert!(line.contains(",UVXY,"), "omega should be UVXY: {line}");
        }
    }

    #[test]
    fn pipeline_respects_slice() {
        let dir = TempDir::new().unwrap();
        let days = weekdays(date(2024, 1, 2), 4);
        let store = cli::load_store(&analysis_config(dir.path()), &mock_port(&days), None).unwrap();
        let mut engine = PackCorrelationEngine::new(&store, "SPY").unwrap();

        let output = dir.path().join("corr.csv");
        let summary =
            cli::run_correlation_pipeline(&mut engine, Some(1), Some(-1), &CsvReportAdapter, &output)
                .unwrap();
        assert_eq!(summary.recorded, days[1..3].to_vec());
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn ingest_saves_state() {
        let ws = Workspace::new(2);
        ws.run(&["ingest"]).unwrap();

        let saved = JsonStateAdapter::new(ws.path("state.json"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(saved.series.len(), 4);

        // nothing new on a second run
        ws.run(&["ingest"]).unwrap();
        let again = JsonStateAdapter::new(ws.path("state.json"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(saved, again);
    }

    #[test]
    fn correlate_writes_configured_table() {
        let ws = Workspace::new(3);
        ws.run(&["correlate"]).unwrap();

        let content = fs::read_to_string(ws.path("reports/corr.csv")).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn correlate_output_flag_overrides_config() {
        let ws = Workspace::new(3);
        let out = ws.path("latest.csv");
        ws.run(&["correlate", "--start", "-1", "-o", &out.display().to_string()])
            .unwrap();

        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains(&ws.days[2].to_string()));
    }

    #[test]
    fn day_and_histogram_for_a_trading_day() {
        let ws = Workspace::new(2);
        let d = ws.days[1].to_string();
        ws.run(&["day", "--date", &d]).unwrap();
        ws.run(&["histogram", "--date", &d, "--bins", "10"]).unwrap();
    }

    #[test]
    fn day_without_data_is_not_found() {
        let ws = Workspace::new(2);
        let err = ws.run(&["day", "--date", "2024-01-06"]).unwrap_err();
        assert!(matches!(err, PackError::NotFound { .. }));
    }

    #[test]
    fn histogram_rejects_zero_bins() {
        let ws = Workspace::new(1);
        let d = ws.days[0].to_string();
        let err = ws
            .run(&["histogram", "--date", &d, "--bins", "0"])
            .unwrap_err();
        assert!(matches!(err, PackError::InvalidArgument { .. }));
    }

    #[test]
    fn heatmap_writes_day_rows() {
        let ws = Workspace::new(3);
        ws.run(&["heatmap", "--bins", "8"]).unwrap();

        let content = fs::read_to_string(ws.path("reports/heat.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].split(',').count(), 9);
    }

    #[test]
    fn verify_accepts_range_and_rejects_inverted_one() {
        let ws = Workspace::new(3);
        ws.run(&["verify", "--minutes"]).unwrap();
        ws.run(&["verify", "--start", "2024-01-01", "--end", "2024-01-05"])
            .unwrap();

        let err = ws
            .run(&["verify", "--start", "2024-01-05", "--end", "2024-01-01"])
            .unwrap_err();
        assert!(matches!(err, PackError::InvalidArgument { .. }));
    }

    #[test]
    fn unknown_alpha_override_fails() {
        let ws = Workspace::new(1);
        let err = ws.run(&["correlate", "--alpha", "XYZ"]).unwrap_err();
        assert!(matches!(err, PackError::UnknownTicker { .. }));
    }
}
