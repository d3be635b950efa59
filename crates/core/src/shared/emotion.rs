//! Emotion labels, the fixed valence table, and a dense per-emotion map.
//!
//! Counts, best confidences and exemplar frames are all keyed by [`Emotion`].
//! [`EmotionMap`] stores one slot per label, so every label is present from
//! construction and lookups never need an insert-if-absent branch.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// The seven emotion classes, in classifier output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const COUNT: usize = 7;

    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    /// Position on the [-1, 1] affect axis used for the time-series graph.
    pub fn valence(self) -> f64 {
        match self {
            Emotion::Neutral => 0.0,
            Emotion::Angry => -0.75,
            Emotion::Sad => -0.5,
            Emotion::Disgust => -0.25,
            Emotion::Fear => -1.0,
            Emotion::Surprise => 0.5,
            Emotion::Happy => 1.0,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0:?}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.label() == lowered)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Dense map with exactly one value per [`Emotion`].
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionMap<T> {
    slots: [T; Emotion::COUNT],
}

impl<T> EmotionMap<T> {
    pub fn from_fn(mut f: impl FnMut(Emotion) -> T) -> Self {
        Self {
            slots: Emotion::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, &T)> {
        Emotion::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

impl<T: Clone> EmotionMap<T> {
    pub fn filled(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T: Default> Default for EmotionMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Emotion> for EmotionMap<T> {
    type Output = T;

    fn index(&self, emotion: Emotion) -> &T {
        &self.slots[emotion.slot()]
    }
}

impl<T> IndexMut<Emotion> for EmotionMap<T> {
    fn index_mut(&mut self, emotion: Emotion) -> &mut T {
        &mut self.slots[emotion.slot()]
    }
}

/// Per-emotion classifier confidence. Values are non-negative but need not
/// sum to one.
pub type EmotionVector = EmotionMap<f32>;

impl EmotionVector {
    /// Builds a vector from raw scores in [`Emotion::ALL`] order.
    ///
    /// Returns `None` unless there are exactly seven finite, non-negative
    /// values.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.len() != Emotion::COUNT {
            return None;
        }
        if scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return None;
        }
        Some(Self::from_fn(|e| scores[e.slot()]))
    }

    /// Argmax label and its value. Ties resolve to the earlier label.
    pub fn dominant(&self) -> (Emotion, f32) {
        let mut best = (Emotion::ALL[0], self.slots[0]);
        for (emotion, &value) in self.iter().skip(1) {
            if value > best.1 {
                best = (emotion, value);
            }
        }
        best
    }
}
