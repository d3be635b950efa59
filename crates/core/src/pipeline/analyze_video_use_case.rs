use std::time::Instant;

use crate::analysis::domain::frame_analysis_worker::FrameAnalysisWorker;
use crate::analysis::domain::global_result::GlobalResult;
use crate::analysis::domain::partitioner::partition;
use crate::analysis::domain::result_aggregator::merge;
use crate::detection::domain::frame_analyzer::FrameAnalyzerFactory;
use crate::shared::constants::DEFAULT_BATCH_WORKERS;
use crate::shared::frame::Frame;
use crate::video::domain::video_source::{SourceGuard, VideoSource};

use super::pipeline_error::PipelineError;
use super::pipeline_logger::PipelineLogger;
use super::worker_pool::WorkerPool;

/// Batch analysis of a recorded video.
///
/// Loads every frame, splits the sequence across `workers` analyzers, runs
/// them through a [`WorkerPool`] and merges the partial results. The source
/// is released once loading ends, whether or not it succeeded. This is a
/// single-use struct: a second `execute` fails with
/// [`PipelineError::AlreadyExecuted`].
pub struct AnalyzeVideoUseCase {
    source: Option<Box<dyn VideoSource>>,
    factory: Box<dyn FrameAnalyzerFactory>,
    pool: Box<dyn WorkerPool>,
    logger: Box<dyn PipelineLogger>,
    workers: usize,
    retain_exemplars: bool,
}

impl AnalyzeVideoUseCase {
    pub fn new(
        source: Box<dyn VideoSource>,
        factory: Box<dyn FrameAnalyzerFactory>,
        pool: Box<dyn WorkerPool>,
        logger: Box<dyn PipelineLogger>,
        workers: Option<usize>,
        retain_exemplars: bool,
    ) -> Self {
        Self {
            source: Some(source),
            factory,
            pool,
            logger,
            workers: workers.unwrap_or(DEFAULT_BATCH_WORKERS).max(1),
            retain_exemplars,
        }
    }

    pub fn execute(&mut self) -> Result<GlobalResult, PipelineError> {
        let source = self.source.take().ok_or(PipelineError::AlreadyExecuted)?;

        let start = Instant::now();
        let frames = {
            let mut guard = SourceGuard::new(source);
            load_frames(&mut *guard)?
        };
        self.logger.timing("load", elapsed_ms(start));

        let total_frames = frames.len();
        self.logger.info(&format!(
            "Loaded {total_frames} frames, analyzing with {} workers",
            self.workers
        ));

        let chunks = partition(frames, self.workers);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
        let workers = chunks
            .iter()
            .map(|chunk| {
                let analyzer = self.factory.create().map_err(PipelineError::from_fault)?;
                Ok(FrameAnalysisWorker::new(
                    chunk.worker,
                    analyzer,
                    self.retain_exemplars,
                ))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let start = Instant::now();
        let partials = self.pool.run(workers, chunks, self.logger.as_mut())?;
        self.logger.timing("analyze", elapsed_ms(start));

        let start = Instant::now();
        let result = merge(partials, &offsets, total_frames);
        self.logger.timing("merge", elapsed_ms(start));
        self.logger.summary();

        Ok(result)
    }
}

/// Reads the whole source into memory. Allocation failure is reported as
/// resource exhaustion instead of aborting the process.
fn load_frames(source: &mut dyn VideoSource) -> Result<Vec<Frame>, PipelineError> {
    let exhausted = |e: std::collections::TryReserveError| {
        PipelineError::ResourceExhausted(format!("frame buffer: {e}"))
    };

    let mut frames: Vec<Frame> = Vec::new();
    frames.try_reserve_exact(source.frame_count()).map_err(exhausted)?;

    while let Some(frame) = source
        .read_frame()
        .map_err(|e| PipelineError::Source(e.to_string()))?
    {
        if frames.len() == frames.capacity() {
            frames.try_reserve(1).map_err(exhausted)?;
        }
        frames.push(frame);
    }
    Ok(frames)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
