use serde::{Deserialize, Serialize};

use crate::shared::emotion::{Emotion, EmotionMap};

/// Share of each emotion among labeled frames plus the looked-away rate.
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionPercentages {
    /// Emotions seen at least once, most frequent first; ties keep label
    /// order.
    sorted: Vec<(Emotion, f64)>,
    /// Looked-away frames over all frames, rounded to two decimals.
    looked_away: f64,
}

impl EmotionPercentages {
    /// Emotion shares are relative to labeled frames; the looked-away rate
    /// is relative to `total_frames`. Empty denominators give 0.
    pub fn from_counts(counts: &EmotionMap<usize>, looked_away: usize, total_frames: usize) -> Self {
        let labeled: usize = counts.values().sum();
        let pairs: Vec<(Emotion, f64)> = counts
            .iter()
            .map(|(emotion, &count)| (emotion, ratio(count, labeled)))
            .collect();
        Self::from_pairs(&pairs, round2(ratio(looked_away, total_frames)))
    }

    /// Builds from precomputed percentages. Non-positive entries are treated
    /// as absent.
    pub fn from_pairs(pairs: &[(Emotion, f64)], looked_away: f64) -> Self {
        let mut sorted: Vec<(Emotion, f64)> = Emotion::ALL
            .into_iter()
            .filter_map(|emotion| {
                pairs
                    .iter()
                    .find(|(e, _)| *e == emotion)
                    .filter(|(_, pct)| *pct > 0.0)
                    .map(|&(e, pct)| (e, pct))
            })
            .collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            sorted,
            looked_away,
        }
    }

    pub fn sorted(&self) -> &[(Emotion, f64)] {
        &self.sorted
    }

    pub fn looked_away(&self) -> f64 {
        self.looked_away
    }

    /// Percentage of `emotion`, or `None` when it never occurred.
    pub fn get(&self, emotion: Emotion) -> Option<f64> {
        self.sorted
            .iter()
            .find(|(e, _)| *e == emotion)
            .map(|&(_, pct)| pct)
    }

    pub fn get_or_zero(&self, emotion: Emotion) -> f64 {
        self.get(emotion).unwrap_or(0.0)
    }

    pub fn view(&self) -> PercentageView {
        PercentageView {
            neutral: self.get_or_zero(Emotion::Neutral),
            angry: self.get_or_zero(Emotion::Angry),
            disgust: self.get_or_zero(Emotion::Disgust),
            fear: self.get_or_zero(Emotion::Fear),
            happy: self.get_or_zero(Emotion::Happy),
            sad: self.get_or_zero(Emotion::Sad),
            surprise: self.get_or_zero(Emotion::Surprise),
            looked_away: self.looked_away,
        }
    }
}

/// Flat per-key view consumed by storage and HTTP layers; every value is a
/// percentage in 0–100 and missing emotions are 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentageView {
    pub neutral: f64,
    pub angry: f64,
    pub disgust: f64,
    pub fear: f64,
    pub happy: f64,
    pub sad: f64,
    pub surprise: f64,
    #[serde(rename = "lookedAway")]
    pub looked_away: f64,
}

impl PercentageView {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
