use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analysis::domain::emotion_tally::EmotionTally;
use crate::analysis::domain::global_result::GlobalResult;
use crate::detection::domain::frame_analyzer::FrameAnalyzer;
use crate::video::domain::video_source::{SourceGuard, VideoSource};

use super::pipeline_error::PipelineError;
use super::pipeline_logger::PipelineLogger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    EndOfStream,
    Cancelled,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated(Termination),
}

/// Inline analysis of a live stream, one frame per iteration.
///
/// Aggregates incrementally and always keeps the highest-confidence frame
/// per emotion. The cancellation flag is checked at the top of every
/// iteration. The capture handle is released the moment the session
/// terminates, and termination happens at most once.
pub struct RealtimeSession {
    source: Option<SourceGuard>,
    analyzer: FrameAnalyzer,
    cancelled: Arc<AtomicBool>,
    state: SessionState,
    tally: EmotionTally,
    frames_read: usize,
}

impl RealtimeSession {
    pub fn new(
        source: Box<dyn VideoSource>,
        analyzer: FrameAnalyzer,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source: Some(SourceGuard::new(source)),
            analyzer,
            cancelled,
            state: SessionState::Running,
            tally: EmotionTally::default(),
            frames_read: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Runs one iteration and returns the resulting state.
    ///
    /// A read failure or resource exhaustion terminates the session and is
    /// returned as an error. Calling `step` after termination is a no-op.
    pub fn step(&mut self) -> Result<SessionState, PipelineError> {
        if self.state != SessionState::Running {
            return Ok(self.state);
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return Ok(self.terminate(Termination::Cancelled));
        }

        let Some(source) = self.source.as_mut() else {
            return Ok(self.terminate(Termination::EndOfStream));
        };
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(self.terminate(Termination::EndOfStream)),
            Err(e) => {
                self.terminate(Termination::Failed);
                return Err(PipelineError::Source(e.to_string()));
            }
        };

        let index = self.frames_read;
        self.frames_read += 1;
        match self.analyzer.analyze(&frame) {
            Ok(outcome) => self.tally.record(outcome, index, frame, true),
            Err(fault) => {
                self.terminate(Termination::Failed);
                return Err(PipelineError::from_fault(fault));
            }
        }
        Ok(self.state)
    }

    /// Steps until the session terminates, then finalizes the result.
    pub fn run(mut self, logger: &mut dyn PipelineLogger) -> Result<GlobalResult, PipelineError> {
        logger.info("Realtime analysis started, press Ctrl-C to stop");
        loop {
            match self.step()? {
                SessionState::Running => logger.progress(self.frames_read, 0),
                SessionState::Terminated(reason) => {
                    logger.info(&format!(
                        "Realtime analysis stopped ({reason:?}) after {} frames",
                        self.frames_read
                    ));
                    break;
                }
            }
        }
        Ok(self.finish())
    }

    /// Closes the session and returns the aggregates with the exemplar
    /// table as it stands.
    pub fn finish(mut self) -> GlobalResult {
        self.terminate(Termination::Cancelled);
        GlobalResult::new(std::mem::take(&mut self.tally), self.frames_read)
    }

    fn terminate(&mut self, reason: Termination) -> SessionState {
        if self.state == SessionState::Running {
            self.source = None;
            self.state = SessionState::Terminated(reason);
        }
        self.state
    }
}
