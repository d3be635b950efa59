pub mod latex_report_renderer;
pub mod text_report_renderer;
