use thiserror::Error;

use crate::detection::domain::analysis_fault::AnalysisFault;

/// Run-level failure of a batch analysis or realtime session.
///
/// None of these variants carries a partial result: when a run fails the
/// caller gets only the error.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("resource exhausted during analysis: {0}; try fewer workers")]
    ResourceExhausted(String),
    #[error("analysis worker {0} panicked")]
    WorkerPanicked(usize),
    #[error("could not build frame analyzer: {0}")]
    AnalyzerSetup(AnalysisFault),
    #[error("video source failed: {0}")]
    Source(String),
    #[error("pipeline already executed")]
    AlreadyExecuted,
}

impl PipelineError {
    /// Maps a fault that escaped per-frame recovery to a run-level error.
    pub fn from_fault(fault: AnalysisFault) -> Self {
        match fault {
            AnalysisFault::ResourceExhausted(msg) => PipelineError::ResourceExhausted(msg),
            other => PipelineError::AnalyzerSetup(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_fault_maps_to_exhaustion() {
        let err = PipelineError::from_fault(AnalysisFault::ResourceExhausted("oom".into()));
        assert!(matches!(err, PipelineError::ResourceExhausted(ref m) if m == "oom"));
        assert!(err.to_string().contains("fewer workers"));
    }

    #[test]
    fn test_other_faults_map_to_setup() {
        let err = PipelineError::from_fault(AnalysisFault::backend("bad model"));
        assert!(matches!(err, PipelineError::AnalyzerSetup(_)));
    }
}
