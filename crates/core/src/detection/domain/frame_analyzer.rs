use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::detection::domain::emotion_classifier::{Classification, EmotionClassifier};
use crate::detection::domain::facial_feature_detector::FacialFeatureDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Result of analyzing one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// An emotion was classified. `region` is the brow/eye box that was
    /// classified, or `None` when the whole-frame fallback produced it.
    Detected {
        region: Option<Region>,
        classification: Classification,
    },
    /// No eye region, or every classification attempt failed.
    LookedAway,
    /// Classification returned nothing usable; the frame is not counted.
    Skipped,
}

/// Per-frame detection and classification with local fault recovery.
///
/// Flow: detect brows/eyes → no eyes ⇒ looked away → classify the union
/// box → on failure classify the whole frame → normalize the payload.
pub struct FrameAnalyzer {
    detector: Box<dyn FacialFeatureDetector>,
    classifier: Box<dyn EmotionClassifier>,
}

impl FrameAnalyzer {
    pub fn new(
        detector: Box<dyn FacialFeatureDetector>,
        classifier: Box<dyn EmotionClassifier>,
    ) -> Self {
        Self {
            detector,
            classifier,
        }
    }

    /// Analyzes a frame. Faults are absorbed into [`FrameOutcome::LookedAway`];
    /// only [`AnalysisFault::ResourceExhausted`] escapes.
    pub fn analyze(&mut self, frame: &Frame) -> Result<FrameOutcome, AnalysisFault> {
        match self.try_analyze(frame) {
            Ok(outcome) => Ok(outcome),
            Err(fault) if fault.is_resource_exhaustion() => Err(fault),
            Err(fault) => {
                log::debug!("Frame {}: {fault}; counted as looked away", frame.index());
                Ok(FrameOutcome::LookedAway)
            }
        }
    }

    fn try_analyze(&mut self, frame: &Frame) -> Result<FrameOutcome, AnalysisFault> {
        let features = self.detector.detect(frame)?;
        let Some(roi) = features.region_of_interest() else {
            return Ok(FrameOutcome::LookedAway);
        };

        let attempt = frame
            .crop(&roi)
            .ok_or_else(|| AnalysisFault::InvalidRegion(format!("{roi:?} outside frame")))
            .and_then(|crop| self.classifier.classify_region(&crop));

        let (region, payload) = match attempt {
            Ok(payload) => (Some(roi), payload),
            Err(fault) if fault.is_resource_exhaustion() => return Err(fault),
            Err(fault) => {
                log::debug!(
                    "Frame {}: region classification failed ({fault}), using whole frame",
                    frame.index()
                );
                (None, self.classifier.classify_frame(frame)?)
            }
        };

        Ok(match payload.normalize() {
            Some(classification) => FrameOutcome::Detected {
                region,
                classification,
            },
            None => FrameOutcome::Skipped,
        })
    }
}

/// Builds one [`FrameAnalyzer`] per worker; inference sessions are not
/// shared across threads.
pub trait FrameAnalyzerFactory: Send + Sync {
    fn create(&self) -> Result<FrameAnalyzer, AnalysisFault>;
}

impl<F> FrameAnalyzerFactory for F
where
    F: Fn() -> Result<FrameAnalyzer, AnalysisFault> + Send + Sync,
{
    fn create(&self) -> Result<FrameAnalyzer, AnalysisFault> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::emotion_classifier::ClassifierPayload;
    use crate::detection::domain::facial_feature_detector::FacialFeatures;
    use crate::shared::emotion::Emotion;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct FixedDetector(Result<FacialFeatures, AnalysisFault>);

    impl FacialFeatureDetector for FixedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<FacialFeatures, AnalysisFault> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Calls {
        region: usize,
        whole_frame: usize,
    }

    struct ScriptedClassifier {
        region: Result<ClassifierPayload, AnalysisFault>,
        whole_frame: Result<ClassifierPayload, AnalysisFault>,
        calls: Arc<Mutex<Calls>>,
    }

    impl EmotionClassifier for ScriptedClassifier {
        fn classify_region(&mut self, _crop: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
            self.calls.lock().unwrap().region += 1;
            self.region.clone()
        }

        fn classify_frame(&mut self, _frame: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
            self.calls.lock().unwrap().whole_frame += 1;
            self.whole_frame.clone()
        }
    }

    // --- Helpers ---

    fn frame() -> Frame {
        Frame::new(vec![90; 64 * 64 * 3], 64, 64, 3, 3)
    }

    fn eyes() -> FacialFeatures {
        FacialFeatures {
            brows: vec![Region {
                x: 10,
                y: 10,
                width: 40,
                height: 6,
            }],
            eyes: vec![Region {
                x: 12,
                y: 20,
                width: 36,
                height: 10,
            }],
        }
    }

    fn scores_for(emotion: Emotion) -> ClassifierPayload {
        let mut scores = vec![1.0; 7];
        scores[Emotion::ALL.iter().position(|e| *e == emotion).unwrap()] = 80.0;
        ClassifierPayload::from_scores(scores)
    }

    fn analyzer(
        detected: Result<FacialFeatures, AnalysisFault>,
        region: Result<ClassifierPayload, AnalysisFault>,
        whole_frame: Result<ClassifierPayload, AnalysisFault>,
    ) -> (FrameAnalyzer, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let analyzer = FrameAnalyzer::new(
            Box::new(FixedDetector(detected)),
            Box::new(ScriptedClassifier {
                region,
                whole_frame,
                calls: calls.clone(),
            }),
        );
        (analyzer, calls)
    }

    // --- Tests ---

    #[test]
    fn test_no_eyes_is_looked_away_without_classifying() {
        let (mut a, calls) = analyzer(
            Ok(FacialFeatures::default()),
            Ok(scores_for(Emotion::Happy)),
            Ok(scores_for(Emotion::Happy)),
        );
        assert_eq!(a.analyze(&frame()).unwrap(), FrameOutcome::LookedAway);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.region + calls.whole_frame, 0);
    }

    #[test]
    fn test_region_classification_reports_region() {
        let (mut a, _) = analyzer(
            Ok(eyes()),
            Ok(scores_for(Emotion::Sad)),
            Err(AnalysisFault::backend("unused")),
        );
        match a.analyze(&frame()).unwrap() {
            FrameOutcome::Detected {
                region,
                classification,
            } => {
                assert_eq!(region.unwrap().y, 10);
                assert_eq!(classification.dominant, Emotion::Sad);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_invalid_region_falls_back_to_whole_frame() {
        let (mut a, calls) = analyzer(
            Ok(eyes()),
            Err(AnalysisFault::InvalidRegion("too small".into())),
            Ok(scores_for(Emotion::Surprise)),
        );
        match a.analyze(&frame()).unwrap() {
            FrameOutcome::Detected {
                region,
                classification,
            } => {
                assert!(region.is_none());
                assert_eq!(classification.dominant, Emotion::Surprise);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().whole_frame, 1);
    }

    #[test]
    fn test_failed_fallback_is_looked_away() {
        let (mut a, _) = analyzer(
            Ok(eyes()),
            Err(AnalysisFault::InvalidRegion("too small".into())),
            Err(AnalysisFault::backend("model error")),
        );
        assert_eq!(a.analyze(&frame()).unwrap(), FrameOutcome::LookedAway);
    }

    #[test]
    fn test_detector_fault_is_looked_away() {
        let (mut a, _) = analyzer(
            Err(AnalysisFault::backend("cascade failed")),
            Ok(scores_for(Emotion::Happy)),
            Ok(scores_for(Emotion::Happy)),
        );
        assert_eq!(a.analyze(&frame()).unwrap(), FrameOutcome::LookedAway);
    }

    #[test]
    fn test_unusable_payload_is_skipped() {
        let (mut a, _) = analyzer(
            Ok(eyes()),
            Ok(ClassifierPayload::default()),
            Ok(scores_for(Emotion::Happy)),
        );
        assert_eq!(a.analyze(&frame()).unwrap(), FrameOutcome::Skipped);
    }

    #[test]
    fn test_resource_exhaustion_escapes() {
        let (mut a, _) = analyzer(
            Ok(eyes()),
            Err(AnalysisFault::ResourceExhausted("allocation failed".into())),
            Ok(scores_for(Emotion::Happy)),
        );
        assert!(matches!(
            a.analyze(&frame()),
            Err(AnalysisFault::ResourceExhausted(_))
        ));
    }

    #[test]
    fn test_closure_is_a_factory() {
        let factory = || -> Result<FrameAnalyzer, AnalysisFault> {
            Ok(analyzer(
                Ok(FacialFeatures::default()),
                Ok(ClassifierPayload::default()),
                Ok(ClassifierPayload::default()),
            )
            .0)
        };
        let mut a = FrameAnalyzerFactory::create(&factory).unwrap();
        assert_eq!(a.analyze(&frame()).unwrap(), FrameOutcome::LookedAway);
    }
}
