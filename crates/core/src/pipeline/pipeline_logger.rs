use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for analysis orchestration events.
///
/// Use cases report through this port so the CLI can print progress and
/// timings while tests stay silent.
pub trait PipelineLogger: Send {
    /// Frames analyzed so far across all workers. `total` is 0 for live
    /// sources.
    fn progress(&mut self, current: usize, total: usize);

    /// Wall-clock duration of a named stage (`load`, `analyze`, `merge`, ...).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Human-readable status message.
    fn info(&mut self, message: &str);

    /// End-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logs through the `log` facade and prints a timing summary at the end.
///
/// Progress lines are throttled to one every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    last_reported: usize,
    timings: BTreeMap<String, f64>,
    start_time: Instant,
    frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            last_reported: 0,
            timings: BTreeMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// The formatted summary, or `None` when no stage was timed.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Analysis summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        for (stage, total_ms) in &self.timings {
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("  {stage:10}: {total_ms:8.0}ms  ({pct:4.1}%)"));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    /// Accumulated duration of a stage.
    pub fn timing_for(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = self.frames.max(current);
        let due = current >= self.last_reported + self.throttle_frames;
        if !due && current != total {
            return;
        }
        self.last_reported = current;
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Analyzed {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Analyzed {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        *self.timings.entry(stage.to_string()).or_default() += duration_ms;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
