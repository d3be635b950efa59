use crate::analysis::domain::global_result::GlobalResult;
use crate::report::domain::insight_engine;
use crate::report::domain::percentages::EmotionPercentages;
use crate::shared::emotion::Emotion;
use crate::shared::frame::Frame;

/// Everything a renderer needs about one analyzed video.
pub struct AnalysisReport<'a> {
    /// Base name for output files, usually the video's file stem.
    pub name: String,
    pub percentages: EmotionPercentages,
    pub takeaways: Vec<String>,
    pub result: &'a GlobalResult,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(name: impl Into<String>, result: &'a GlobalResult) -> Self {
        let percentages = EmotionPercentages::from_counts(
            &result.tally.emotion_counts,
            result.tally.looked_away,
            result.total_frames,
        );
        let takeaways = insight_engine::takeaways(&percentages);
        Self {
            name: name.into(),
            percentages,
            takeaways,
            result,
        }
    }

    pub fn looked_away_frames(&self) -> usize {
        self.result.tally.looked_away
    }

    pub fn coordinates(&self) -> &[(usize, f64)] {
        self.result.coordinates()
    }

    pub fn exemplars(&self) -> impl Iterator<Item = (Emotion, f32, &Frame)> {
        self.result.tally.exemplars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::emotion_tally::EmotionTally;
    use crate::report::domain::insight_engine::NO_OUTLIERS;
    use approx::assert_relative_eq;

    #[test]
    fn test_report_derives_percentages_and_takeaways() {
        let mut tally = EmotionTally::default();
        tally.emotion_counts[Emotion::Happy] = 5;
        tally.looked_away = 5;
        let result = GlobalResult::new(tally, 10);

        let report = AnalysisReport::new("clip", &result);

        assert_relative_eq!(report.percentages.get(Emotion::Happy).unwrap(), 100.0);
        assert_relative_eq!(report.percentages.looked_away(), 50.0);
        assert!(report.takeaways[0].starts_with("The person looked away quite often"));
        assert_eq!(report.looked_away_frames(), 5);
    }

    #[test]
    fn test_empty_result_reports_no_outliers() {
        let result = GlobalResult::default();
        let report = AnalysisReport::new("empty", &result);
        assert_eq!(report.takeaways, vec![NO_OUTLIERS]);
        assert_eq!(report.exemplars().count(), 0);
    }
}
