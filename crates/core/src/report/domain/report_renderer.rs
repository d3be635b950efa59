use std::path::PathBuf;

use thiserror::Error;

use crate::report::domain::analysis_report::AnalysisReport;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write report output: {0}")]
    Output(#[source] std::io::Error),
}

/// Port for turning an [`AnalysisReport`] into a human-readable artifact.
///
/// Callers treat failures as warnings; numeric results are never affected.
pub trait ReportRenderer: Send {
    fn render(&self, report: &AnalysisReport<'_>) -> Result<(), RenderError>;
}
