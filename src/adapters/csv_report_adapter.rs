//! CSV report adapter for correlation tables and heatmaps.

use crate::domain::correlation::{CorrelationTable, HeatmapMatrix};
use crate::domain::error::PackError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;
use tracing::info;

const TABLE_HEADER: [&str; 15] = [
    "date",
    "mean_corr",
    "directional_corr",
    "median_corr",
    "stdev_corr",
    "alpha_gain",
    "beta",
    "beta_corr",
    "epsilon",
    "epsilon_corr",
    "sigma",
    "sigma_corr",
    "omega",
    "omega_corr",
    "rolling_mean",
];

pub struct CsvReportAdapter;

fn csv_error(path: &Path, e: csv::Error) -> PackError {
    PackError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn open_writer(path: &Path) -> Result<csv::Writer<fs::File>, PackError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    csv::Writer::from_path(path).map_err(|e| csv_error(path, e))
}

impl ReportPort for CsvReportAdapter {
    /// One row per record in processing order, with the table's rolling mean
    /// (blank during warm-up).
    fn write_table(&self, table: &CorrelationTable, output_path: &Path) -> Result<(), PackError> {
        let mut wtr = open_writer(output_path)?;
        wtr.write_record(TABLE_HEADER)
            .map_err(|e| csv_error(output_path, e))?;

        let (_, rolling) = table.rolling_mean();
        for (r, avg) in table.records().iter().zip(rolling) {
            let row = [
                r.date.to_string(),
                r.mean_corr.to_string(),
                r.directional_corr.to_string(),
                r.median_corr.to_string(),
                r.stdev_corr.to_string(),
                r.alpha_gain.to_string(),
                r.beta.to_string(),
                r.beta_corr.to_string(),
                r.epsilon.to_string(),
                r.epsilon_corr.to_string(),
                r.sigma.to_string(),
                r.sigma_corr.to_string(),
                r.omega.to_string(),
                r.omega_corr.to_string(),
                avg.map(|v| v.to_string()).unwrap_or_default(),
            ];
            wtr.write_record(&row)
                .map_err(|e| csv_error(output_path, e))?;
        }
        wtr.flush()?;
        info!(path = %output_path.display(), rows = table.len(), "wrote correlation table");
        Ok(())
    }

    /// Header row of bin centers, then one row of counts per day.
    fn write_heatmap(
        &self,
        heatmap: &HeatmapMatrix,
        output_path: &Path,
    ) -> Result<(), PackError> {
        let mut wtr = open_writer(output_path)?;

        let header = std::iter::once("date".to_string())
            .chain(heatmap.bin_centers.iter().map(|c| format!("{c:.4}")));
        wtr.write_record(header)
            .map_err(|e| csv_error(output_path, e))?;

        for (date, counts) in heatmap.days.iter().zip(&heatmap.counts) {
            let row = std::iter::once(date.to_string()).chain(counts.iter().map(u32::to_string));
            wtr.write_record(row)
                .map_err(|e| csv_error(output_path, e))?;
        }
        wtr.flush()?;
        info!(
            path = %output_path.display(),
            days = heatmap.days.len(),
            bins = heatmap.bins(),
            "wrote heatmap"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::correlation::CorrelationRecord;
    use crate::domain::ticker::Ticker;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(day: u32, mean_corr: f64) -> CorrelationRecord {
        let t = |s: &str| Ticker::new(s).unwrap();
        CorrelationRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            mean_corr,
            directional_corr: mean_corr,
            median_corr: 0.5,
            stdev_corr: 0.1,
            alpha_gain: 1.01,
            beta: t("QQQ"),
            beta_corr: 0.9,
            epsilon: t("DIA"),
            epsilon_corr: 0.5,
            sigma: t("IWM"),
            sigma_corr: 0.05,
            omega: t("UVXY"),
            omega_corr: -0.8,
        }
    }

    #[test]
    fn table_has_header_and_rolling_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("corr.csv");

        let mut table = CorrelationTable::new();
        table.upsert(record(2, 0.2));
        table.upsert(record(3, 0.4));
        CsvReportAdapter.write_table(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,mean_corr,directional_corr"));
        assert!(lines[1].starts_with("2024-01-02,0.2,"));
        assert!(lines[1].ends_with(",UVXY,-0.8,"));
        assert!(lines[2].contains(",QQQ,0.9,DIA,"));
        assert!(lines[2].ends_with(",0.30000000000000004") || lines[2].ends_with(",0.3"));
    }

    #[test]
    fn heatmap_rows_per_day() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heat.csv");

        let heatmap = HeatmapMatrix {
            days: vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ],
            bin_centers: vec![-0.5, 0.5],
            counts: vec![vec![1, 3], vec![0, 2]],
        };
        CsvReportAdapter.write_heatmap(&heatmap, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "date,-0.5000,0.5000\n2024-01-02,1,3\n2024-01-03,0,2\n"
        );
    }
}
