use crate::analysis::domain::emotion_tally::EmotionTally;
use crate::analysis::domain::frame_analysis_worker::PartialResult;
use crate::analysis::domain::global_result::GlobalResult;
use crate::shared::emotion::Emotion;

/// Merges worker results into one [`GlobalResult`].
///
/// `partials` must be in worker-index order and `offsets[k]` is the global
/// index of worker `k`'s first frame. Counts are summed; coordinates are
/// shifted by the worker's offset and concatenated. Per emotion, the best
/// confidence and its frame come from the earliest worker holding the
/// maximum.
pub fn merge(partials: Vec<PartialResult>, offsets: &[usize], total_frames: usize) -> GlobalResult {
    debug_assert_eq!(partials.len(), offsets.len());
    let mut global = EmotionTally::default();

    for (partial, &offset) in partials.into_iter().zip(offsets) {
        let tally = partial.tally;

        for emotion in Emotion::ALL {
            global.emotion_counts[emotion] += tally.emotion_counts[emotion];
        }
        global.looked_away += tally.looked_away;
        global.coordinates.extend(
            tally
                .coordinates
                .into_iter()
                .map(|(local, valence)| (offset + local, valence)),
        );

        let mut best_frames = tally.best_frames;
        for emotion in Emotion::ALL {
            if tally.best_confidence[emotion] > global.best_confidence[emotion] {
                global.best_confidence[emotion] = tally.best_confidence[emotion];
                global.best_frames[emotion] = best_frames[emotion].take();
            }
        }
    }

    GlobalResult::new(global, total_frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use approx::assert_relative_eq;

    // --- Helpers ---

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0; 2 * 2 * 3], 2, 2, 3, index)
    }

    fn partial(worker: usize, happy: usize, looked_away: usize) -> PartialResult {
        let mut tally = EmotionTally::default();
        tally.emotion_counts[Emotion::Happy] = happy;
        tally.looked_away = looked_away;
        tally.coordinates = (0..happy).map(|i| (i, 1.0)).collect();
        PartialResult { worker, tally }
    }

    fn with_best(mut p: PartialResult, emotion: Emotion, confidence: f32, index: usize) -> PartialResult {
        p.tally.best_confidence[emotion] = confidence;
        p.tally.best_frames[emotion] = Some(frame(index));
        p
    }

    // --- Tests ---

    #[test]
    fn test_counts_are_summed() {
        let global = merge(vec![partial(0, 2, 1), partial(1, 3, 4)], &[0, 5], 10);
        assert_eq!(global.tally.emotion_counts[Emotion::Happy], 5);
        assert_eq!(global.tally.looked_away, 5);
        assert_eq!(global.total_frames, 10);
    }

    #[test]
    fn test_count_totals_ignore_merge_order() {
        let forward = merge(vec![partial(0, 2, 1), partial(1, 3, 4)], &[0, 5], 10);
        let reverse = merge(vec![partial(1, 3, 4), partial(0, 2, 1)], &[5, 0], 10);
        assert_eq!(forward.tally.emotion_counts, reverse.tally.emotion_counts);
        assert_eq!(forward.tally.looked_away, reverse.tally.looked_away);
    }

    #[test]
    fn test_coordinates_are_shifted_by_offset() {
        let global = merge(vec![partial(0, 1, 0), partial(1, 2, 0)], &[0, 4], 8);
        assert_eq!(global.coordinates(), &[(0, 1.0), (4, 1.0), (5, 1.0)]);
    }

    #[test]
    fn test_equal_confidence_goes_to_earliest_worker() {
        let first = with_best(partial(0, 1, 0), Emotion::Happy, 80.0, 0);
        let second = with_best(partial(1, 1, 0), Emotion::Happy, 80.0, 5);
        let global = merge(vec![first, second], &[0, 5], 10);

        assert_relative_eq!(global.tally.best_confidence[Emotion::Happy], 80.0);
        let exemplar = global.tally.best_frames[Emotion::Happy].as_ref().unwrap();
        assert_eq!(exemplar.index(), 0);
    }

    #[test]
    fn test_higher_confidence_wins_across_workers() {
        let first = with_best(partial(0, 1, 0), Emotion::Sad, 40.0, 1);
        let second = with_best(partial(1, 1, 0), Emotion::Sad, 65.0, 7);
        let global = merge(vec![first, second], &[0, 5], 10);

        assert_relative_eq!(global.tally.best_confidence[Emotion::Sad], 65.0);
        assert_eq!(global.tally.best_frames[Emotion::Sad].as_ref().unwrap().index(), 7);
    }

    #[test]
    fn test_no_partials_is_empty_result() {
        let global = merge(Vec::new(), &[], 0);
        assert_eq!(global.tally.labeled_frames(), 0);
        assert!(global.coordinates().is_empty());
    }
}
