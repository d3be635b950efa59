use thiserror::Error;

/// Failure reported by a detector or classifier for a single frame.
///
/// Every variant except [`AnalysisFault::ResourceExhausted`] is local to the
/// frame that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisFault {
    #[error("region unusable for classification: {0}")]
    InvalidRegion(String),
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl AnalysisFault {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        AnalysisFault::Backend(err.to_string())
    }

    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, AnalysisFault::ResourceExhausted(_))
    }
}
