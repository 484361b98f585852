//! Report output port trait.

use crate::domain::correlation::{CorrelationTable, HeatmapMatrix};
use crate::domain::error::PackError;
use std::path::Path;

/// Port for writing correlation results for external plotting tools.
pub trait ReportPort {
    fn write_table(&self, table: &CorrelationTable, output_path: &Path) -> Result<(), PackError>;

    fn write_heatmap(&self, heatmap: &HeatmapMatrix, output_path: &Path)
        -> Result<(), PackError>;
}
