pub mod analysis_report;
pub mod insight_engine;
pub mod percentages;
pub mod report_renderer;
