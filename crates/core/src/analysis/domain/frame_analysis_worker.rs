use crate::analysis::domain::emotion_tally::EmotionTally;
use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::detection::domain::frame_analyzer::FrameAnalyzer;
use crate::shared::constants::PROGRESS_INTERVAL_FRAMES;
use crate::shared::frame::Frame;

/// One worker's tally over its chunk, with chunk-local coordinates.
#[derive(Clone, Debug)]
pub struct PartialResult {
    pub worker: usize,
    pub tally: EmotionTally,
}

/// Analyzes one contiguous chunk of frames with its own [`FrameAnalyzer`].
pub struct FrameAnalysisWorker {
    worker: usize,
    analyzer: FrameAnalyzer,
    retain_exemplars: bool,
}

impl FrameAnalysisWorker {
    pub fn new(worker: usize, analyzer: FrameAnalyzer, retain_exemplars: bool) -> Self {
        Self {
            worker,
            analyzer,
            retain_exemplars,
        }
    }

    /// Runs the chunk in order. `on_progress` receives the number of frames
    /// processed so far every [`PROGRESS_INTERVAL_FRAMES`] frames.
    ///
    /// Per-frame faults are absorbed by the analyzer; only resource
    /// exhaustion aborts the chunk.
    pub fn run(
        mut self,
        frames: Vec<Frame>,
        on_progress: &mut dyn FnMut(usize),
    ) -> Result<PartialResult, AnalysisFault> {
        let mut tally = EmotionTally::default();

        for (local_index, frame) in frames.into_iter().enumerate() {
            let outcome = self.analyzer.analyze(&frame)?;
            tally.record(outcome, local_index, frame, self.retain_exemplars);

            let processed = local_index + 1;
            if processed % PROGRESS_INTERVAL_FRAMES == 0 {
                on_progress(processed);
            }
        }

        Ok(PartialResult {
            worker: self.worker,
            tally,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::emotion_classifier::{ClassifierPayload, EmotionClassifier};
    use crate::detection::domain::facial_feature_detector::{
        FacialFeatureDetector, FacialFeatures,
    };
    use crate::shared::emotion::Emotion;
    use crate::shared::region::Region;

    // --- Stubs ---

    /// Finds eyes on even frame indices only.
    struct EvenFramesHaveEyes;

    impl FacialFeatureDetector for EvenFramesHaveEyes {
        fn detect(&mut self, frame: &Frame) -> Result<FacialFeatures, AnalysisFault> {
            if frame.index() % 2 == 1 {
                return Ok(FacialFeatures::default());
            }
            Ok(FacialFeatures {
                brows: vec![],
                eyes: vec![Region {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                }],
            })
        }
    }

    struct AlwaysHappy;

    impl EmotionClassifier for AlwaysHappy {
        fn classify_region(&mut self, _crop: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
            Ok(ClassifierPayload::from_scores(vec![
                0.0, 0.0, 0.0, 75.0, 0.0, 0.0, 25.0,
            ]))
        }

        fn classify_frame(&mut self, frame: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
            self.classify_region(frame)
        }
    }

    struct Exhausted;

    impl EmotionClassifier for Exhausted {
        fn classify_region(&mut self, _crop: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
            Err(AnalysisFault::ResourceExhausted("out of memory".into()))
        }

        fn classify_frame(&mut self, _frame: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
            Err(AnalysisFault::ResourceExhausted("out of memory".into()))
        }
    }

    // --- Helpers ---

    fn frames(range: std::ops::Range<usize>) -> Vec<Frame> {
        range
            .map(|i| Frame::new(vec![0; 8 * 8 * 3], 8, 8, 3, i))
            .collect()
    }

    fn worker(classifier: Box<dyn EmotionClassifier>) -> FrameAnalysisWorker {
        FrameAnalysisWorker::new(
            1,
            FrameAnalyzer::new(Box::new(EvenFramesHaveEyes), classifier),
            true,
        )
    }

    // --- Tests ---

    #[test]
    fn test_uses_chunk_local_indices() {
        let partial = worker(Box::new(AlwaysHappy))
            .run(frames(10..14), &mut |_| {})
            .unwrap();

        assert_eq!(partial.worker, 1);
        assert_eq!(partial.tally.emotion_counts[Emotion::Happy], 2);
        assert_eq!(partial.tally.looked_away, 2);
        assert_eq!(partial.tally.coordinates, vec![(0, 1.0), (2, 1.0)]);
        let exemplar = partial.tally.best_frames[Emotion::Happy].as_ref().unwrap();
        assert_eq!(exemplar.index(), 10);
    }

    #[test]
    fn test_empty_chunk_is_all_zero() {
        let partial = worker(Box::new(AlwaysHappy))
            .run(Vec::new(), &mut |_| {})
            .unwrap();
        assert_eq!(partial.tally.labeled_frames(), 0);
        assert_eq!(partial.tally.looked_away, 0);
        assert!(partial.tally.coordinates.is_empty());
    }

    #[test]
    fn test_progress_reported_every_interval() {
        let mut reported = Vec::new();
        worker(Box::new(AlwaysHappy))
            .run(frames(0..250), &mut |n| reported.push(n))
            .unwrap();
        assert_eq!(reported, vec![100, 200]);
    }

    #[test]
    fn test_resource_exhaustion_aborts_chunk() {
        let result = worker(Box::new(Exhausted)).run(frames(0..4), &mut |_| {});
        assert!(matches!(result, Err(AnalysisFault::ResourceExhausted(_))));
    }
}
