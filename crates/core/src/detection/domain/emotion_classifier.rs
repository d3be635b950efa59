use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::shared::emotion::{Emotion, EmotionVector};
use crate::shared::frame::Frame;

/// Raw answer from a classifier backend, before validation.
///
/// Backends fill `scores` (seven values in [`Emotion::ALL`] order) when they
/// can; some only report a dominant label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassifierPayload {
    pub scores: Option<Vec<f32>>,
    pub dominant_label: Option<String>,
}

/// A validated classification.
///
/// `scores` and `confidence` are absent when the backend only supplied a
/// label; such classifications still count but never become exemplars.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub dominant: Emotion,
    pub confidence: Option<f32>,
    pub scores: Option<EmotionVector>,
}

impl ClassifierPayload {
    pub fn from_scores(scores: Vec<f32>) -> Self {
        Self {
            scores: Some(scores),
            dominant_label: None,
        }
    }

    /// Validates the payload into a [`Classification`].
    ///
    /// A well-formed score vector wins and its argmax is the dominant label.
    /// Otherwise a recognizable `dominant_label` is used on its own. Returns
    /// `None` when neither is usable.
    pub fn normalize(self) -> Option<Classification> {
        if let Some(vector) = self.scores.as_deref().and_then(EmotionVector::from_scores) {
            let (dominant, confidence) = vector.dominant();
            return Some(Classification {
                dominant,
                confidence: Some(confidence),
                scores: Some(vector),
            });
        }

        let dominant = self.dominant_label?.parse::<Emotion>().ok()?;
        Some(Classification {
            dominant,
            confidence: None,
            scores: None,
        })
    }
}

/// Domain interface for emotion classification.
pub trait EmotionClassifier: Send {
    /// Classifies a cropped face region. Fails with
    /// [`AnalysisFault::InvalidRegion`] when the crop is unusable.
    fn classify_region(&mut self, crop: &Frame) -> Result<ClassifierPayload, AnalysisFault>;

    /// Classifies the whole frame without requiring a prior detection.
    fn classify_frame(&mut self, frame: &Frame) -> Result<ClassifierPayload, AnalysisFault>;
}
