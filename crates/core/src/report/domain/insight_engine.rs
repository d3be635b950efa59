//! Rule-based takeaways derived from emotion percentages.
//!
//! Rules are evaluated in a fixed order and that order is kept in the
//! output. An emotion counts as present when its percentage is above zero;
//! the pairwise comparisons only fire when both emotions are present.

use crate::report::domain::percentages::EmotionPercentages;
use crate::shared::emotion::Emotion;

pub const LOOKED_AWAY_THRESHOLD: f64 = 7.5;
pub const FEAR_THRESHOLD: f64 = 5.0;
pub const HAPPY_THRESHOLD: f64 = 20.0;
pub const HAPPY_TO_SAD_DIFFERENCE: f64 = 10.0;
pub const HAPPY_TO_ANGRY_DIFFERENCE: f64 = 10.0;
pub const NEUTRAL_TO_SURPRISE_DIFFERENCE: f64 = 10.0;
pub const DISGUST_ANGRY_THRESHOLD: f64 = 12.5;
pub const SAD_THRESHOLD: f64 = 15.0;

/// Returned alone when no rule fires.
pub const NO_OUTLIERS: &str = "There were no notable outliers in the video.";

const LOOKED_AWAY: &str = "The person looked away quite often";
const LOOKED_AWAY_FEAR: &str = ", which combined with the fact, that fear emotion was displayed, \
may signal that the person is worried or is feeling endangered. The best way to approach the \
situation is to contact the person and ensure ones safety";
const LOOKED_AWAY_HAPPY: &str = ", at the same time, happiness emotion was seen a lot, so a \
conclusion may be drawn, that the person is feeling excited and impatient about some further \
occurance";
const LOOKED_AWAY_CLOSING: &str = ". All in all, that might be due to the fact, that the person \
is being distracted by something, or, in case if that is some kind of examination, is trying to \
cheat";
const MIXED_EMOTIONS: &str = "Throughout the video, the person displayed mixed emotions, as \
sadness is somewhat close to happiness in terms of occurances";
const MIXED_MOOD: &str = "The person was showing mixed emotions in terms of the mood, as anger \
was mixed with the happiness. That may be tied to the fact that person is exhausted or burnt out";
const CURIOSITY: &str = "In terms of neutral appearance, it was seldom mixed with suprised state, \
which outlines that the person is either curious, or hears, or experiences something new and \
unexpected";
const DISTRESS: &str = "Anger and disgust emotions were recorded for a substantial amount of \
time, which might be a signal to person being heavily disstressed or irritated";
const COMFORT: &str = "Sadness was displayed on a big chunk of the video. With that being said, \
it is highly recomended to approach the person and try to comfort him or her.";

/// Evaluates every rule in order and returns the triggered takeaways, or
/// the single [`NO_OUTLIERS`] sentence.
pub fn takeaways(percentages: &EmotionPercentages) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(text) = looked_away_takeaway(percentages) {
        out.push(text);
    }

    let pairs = [
        (Emotion::Happy, Emotion::Sad, HAPPY_TO_SAD_DIFFERENCE, MIXED_EMOTIONS),
        (Emotion::Happy, Emotion::Angry, HAPPY_TO_ANGRY_DIFFERENCE, MIXED_MOOD),
        (
            Emotion::Neutral,
            Emotion::Surprise,
            NEUTRAL_TO_SURPRISE_DIFFERENCE,
            CURIOSITY,
        ),
    ];
    for (a, b, max_difference, text) in pairs {
        if let (Some(pa), Some(pb)) = (percentages.get(a), percentages.get(b)) {
            if (pa - pb).abs() < max_difference {
                out.push(text.to_string());
            }
        }
    }

    let angry_disgust =
        percentages.get_or_zero(Emotion::Angry) + percentages.get_or_zero(Emotion::Disgust);
    if angry_disgust >= DISGUST_ANGRY_THRESHOLD {
        out.push(DISTRESS.to_string());
    }
    if percentages.get_or_zero(Emotion::Sad) > SAD_THRESHOLD {
        out.push(COMFORT.to_string());
    }

    if out.is_empty() {
        out.push(NO_OUTLIERS.to_string());
    }
    out
}

/// Base statement with optional fear and happiness clauses. The closing
/// sentence follows whenever happiness was present at all.
fn looked_away_takeaway(percentages: &EmotionPercentages) -> Option<String> {
    if percentages.looked_away() < LOOKED_AWAY_THRESHOLD {
        return None;
    }
    let mut text = String::from(LOOKED_AWAY);
    if percentages.get(Emotion::Fear).is_some_and(|p| p >= FEAR_THRESHOLD) {
        text.push_str(LOOKED_AWAY_FEAR);
    }
    if let Some(happy) = percentages.get(Emotion::Happy) {
        if happy >= HAPPY_THRESHOLD {
            text.push_str(LOOKED_AWAY_HAPPY);
        }
        text.push_str(LOOKED_AWAY_CLOSING);
    }
    Some(text)
}
