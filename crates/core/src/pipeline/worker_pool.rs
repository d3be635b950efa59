use crate::analysis::domain::frame_analysis_worker::{FrameAnalysisWorker, PartialResult};
use crate::analysis::domain::partitioner::Chunk;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;

/// Runs one [`FrameAnalysisWorker`] per chunk and collects their results.
///
/// This is a port; infrastructure decides how workers are scheduled.
/// `workers[k]` processes `chunks[k]`. Results come back in worker-index
/// order regardless of completion order, and any worker failure fails the
/// whole run.
pub trait WorkerPool: Send {
    fn run(
        &self,
        workers: Vec<FrameAnalysisWorker>,
        chunks: Vec<Chunk<Frame>>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<PartialResult>, PipelineError>;
}
