use std::io::{self, Write};
use std::sync::Mutex;

use crate::report::domain::analysis_report::AnalysisReport;
use crate::report::domain::report_renderer::{RenderError, ReportRenderer};

/// Writes the plain-text summary to `out`, one line per entry.
pub struct TextReportRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl TextReportRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TextReportRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ReportRenderer for TextReportRenderer<W> {
    fn render(&self, report: &AnalysisReport<'_>) -> Result<(), RenderError> {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in summary_lines(report) {
            writeln!(out, "{line}").map_err(RenderError::Output)?;
        }
        out.flush().map_err(RenderError::Output)
    }
}

/// Emotions from most to least frequent, then the looked-away rate and the
/// takeaways.
pub fn summary_lines(report: &AnalysisReport<'_>) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] Emotions encountered (from the most to the least frequent):",
        report.name
    )];
    for (emotion, pct) in report.percentages.sorted() {
        lines.push(format!(
            "  \"{emotion}\" was present on {pct:.2}% of labeled frames"
        ));
    }
    lines.push(format!(
        "Person looked away {} times, which is {:.2}% of the time",
        report.looked_away_frames(),
        report.percentages.looked_away()
    ));
    lines.push("Key takeaways:".to_string());
    for takeaway in &report.takeaways {
        lines.push(format!("  - {takeaway}"));
    }
    lines
}
