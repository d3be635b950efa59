use std::thread::JoinHandle;

use crate::analysis::domain::frame_analysis_worker::{FrameAnalysisWorker, PartialResult};
use crate::analysis::domain::partitioner::Chunk;
use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::worker_pool::WorkerPool;
use crate::shared::frame::Frame;

/// `(worker index, frames processed by that worker)`.
type ProgressEvent = (usize, usize);

type WorkerHandle = JoinHandle<Result<PartialResult, AnalysisFault>>;

/// Runs each worker on its own OS thread.
///
/// Workers report progress over a channel that the calling thread drains
/// into the logger; the calling thread then joins the workers in index
/// order.
pub struct ThreadedWorkerPool;

impl ThreadedWorkerPool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedWorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool for ThreadedWorkerPool {
    fn run(
        &self,
        workers: Vec<FrameAnalysisWorker>,
        chunks: Vec<Chunk<Frame>>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<PartialResult>, PipelineError> {
        let total: usize = chunks.iter().map(|c| c.items.len()).sum();
        let (progress_tx, progress_rx) = crossbeam_channel::unbounded::<ProgressEvent>();

        let handles: Vec<WorkerHandle> = workers
            .into_iter()
            .zip(chunks)
            .map(|(worker, chunk)| spawn_worker(worker, chunk, progress_tx.clone()))
            .collect();
        drop(progress_tx);

        // Ends once every worker has dropped its sender, including by panic.
        let mut processed = vec![0usize; handles.len()];
        for (worker, count) in progress_rx {
            if let Some(slot) = processed.get_mut(worker) {
                *slot = count;
            }
            logger.info(&format!("Worker {worker}: processed {count} frames"));
            logger.progress(processed.iter().sum(), total);
        }

        let partials = join_workers(handles)?;
        logger.progress(total, total);
        Ok(partials)
    }
}

fn spawn_worker(
    worker: FrameAnalysisWorker,
    chunk: Chunk<Frame>,
    progress_tx: crossbeam_channel::Sender<ProgressEvent>,
) -> WorkerHandle {
    std::thread::spawn(move || {
        let index = chunk.worker;
        let mut report = |count: usize| {
            let _ = progress_tx.send((index, count));
        };
        worker.run(chunk.items, &mut report)
    })
}

/// Joins every worker, even after a failure, and returns the first error
/// in worker order. A panicking worker becomes
/// [`PipelineError::WorkerPanicked`], which relies on the unwinding panic
/// strategy the release profile keeps.
fn join_workers(handles: Vec<WorkerHandle>) -> Result<Vec<PartialResult>, PipelineError> {
    let mut partials = Vec::with_capacity(handles.len());
    let mut first_error: Option<PipelineError> = None;

    for (worker, handle) in handles.into_iter().enumerate() {
        let error = match handle.join() {
            Ok(Ok(partial)) => {
                partials.push(partial);
                continue;
            }
            Ok(Err(fault)) => PipelineError::from_fault(fault),
            Err(_) => PipelineError::WorkerPanicked(worker),
        };
        if first_error.is_none() {
            first_error = Some(error);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(partials),
    }
}
