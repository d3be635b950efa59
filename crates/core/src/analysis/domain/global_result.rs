use crate::analysis::domain::emotion_tally::EmotionTally;

/// Aggregates for a whole run, with coordinates on the source timeline.
#[derive(Clone, Debug, Default)]
pub struct GlobalResult {
    pub tally: EmotionTally,
    /// Frames read from the source, including looked-away and skipped ones.
    pub total_frames: usize,
}

impl GlobalResult {
    pub fn new(tally: EmotionTally, total_frames: usize) -> Self {
        Self {
            tally,
            total_frames,
        }
    }

    /// Coordinates as a time-series, in frame order.
    pub fn coordinates(&self) -> &[(usize, f64)] {
        &self.tally.coordinates
    }
}
