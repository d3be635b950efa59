use crate::detection::domain::frame_analyzer::FrameOutcome;
use crate::shared::emotion::{Emotion, EmotionMap};
use crate::shared::frame::Frame;

/// Stored confidence before any frame of an emotion has been seen.
pub const NO_CONFIDENCE: f32 = -1.0;

/// Running aggregates over analyzed frames.
///
/// Used per worker (coordinates hold chunk-local indices) and for the whole
/// run (coordinates hold global indices).
#[derive(Clone, Debug)]
pub struct EmotionTally {
    pub emotion_counts: EmotionMap<usize>,
    pub looked_away: usize,
    /// `(frame index, valence of the dominant emotion)` in frame order.
    pub coordinates: Vec<(usize, f64)>,
    pub best_confidence: EmotionMap<f32>,
    pub best_frames: EmotionMap<Option<Frame>>,
}

impl Default for EmotionTally {
    fn default() -> Self {
        Self {
            emotion_counts: EmotionMap::default(),
            looked_away: 0,
            coordinates: Vec::new(),
            best_confidence: EmotionMap::filled(NO_CONFIDENCE),
            best_frames: EmotionMap::default(),
        }
    }
}

impl EmotionTally {
    /// Folds one frame's outcome into the tally.
    ///
    /// Looked-away frames only bump `looked_away`; skipped frames contribute
    /// nothing. A detected frame with a strictly higher confidence than the
    /// stored best replaces it, and the frame is kept when `retain_frame` is
    /// set.
    pub fn record(&mut self, outcome: FrameOutcome, index: usize, frame: Frame, retain_frame: bool) {
        let classification = match outcome {
            FrameOutcome::LookedAway => {
                self.looked_away += 1;
                return;
            }
            FrameOutcome::Skipped => return,
            FrameOutcome::Detected { classification, .. } => classification,
        };

        let emotion = classification.dominant;
        self.emotion_counts[emotion] += 1;
        self.coordinates.push((index, emotion.valence()));

        if let Some(confidence) = classification.confidence {
            if confidence > self.best_confidence[emotion] {
                self.best_confidence[emotion] = confidence;
                if retain_frame {
                    self.best_frames[emotion] = Some(frame);
                }
            }
        }
    }

    /// Frames that received an emotion label.
    pub fn labeled_frames(&self) -> usize {
        self.emotion_counts.values().sum()
    }

    /// Retained exemplar frames with their confidence.
    pub fn exemplars(&self) -> impl Iterator<Item = (Emotion, f32, &Frame)> {
        self.best_frames.iter().filter_map(move |(emotion, frame)| {
            frame
                .as_ref()
                .map(|f| (emotion, self.best_confidence[emotion], f))
        })
    }
}
