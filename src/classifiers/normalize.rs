//! Signal normalization: maps each model's raw (label, score) into a uniform
//! `crisis_signal` in [0, 1], higher meaning more crisis-indicative.
//!
//! One rule table per model kind. The irony model is the documented
//! exception: its "signal" is the irony probability, which the engine uses
//! only to dampen the other models' contributions.

use super::{crisis, emotion, irony, sentiment};

/// Emotion labels that count as crisis-positive.
pub const CRISIS_POSITIVE_EMOTIONS: &[&str] = &["grief", "sadness", "fear", "anger"];

/// Compute the normalized crisis signal for one model output.
pub fn crisis_signal(model_id: &str, label: &str, score: f32) -> f32 {
    let score = score.clamp(0.0, 1.0);
    match model_id {
        crisis::MODEL_ID => match label {
            "crisis" | "distress" => score,
            _ => 0.0,
        },
        sentiment::MODEL_ID => match label {
            "negative" => score,
            // Neutral sentiment is weakly informative either way.
            "neutral" => 0.5 * score,
            _ => 0.0,
        },
        irony::MODEL_ID => {
            // Stored as the irony probability; the engine derives the
            // dampener d = 1 - signal, so a strongly ironic message
            // suppresses the other models' contributions.
            if label == "irony" { score } else { 1.0 - score }
        }
        emotion::MODEL_ID => {
            if CRISIS_POSITIVE_EMOTIONS.contains(&label) {
                score
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crisis_labels_pass_through() {
        assert_eq!(crisis_signal("crisis", "crisis", 0.9), 0.9);
        assert_eq!(crisis_signal("crisis", "distress", 0.3), 0.3);
        assert_eq!(crisis_signal("crisis", "safe", 0.95), 0.0);
    }

    #[test]
    fn sentiment_polarity_rules() {
        assert_eq!(crisis_signal("sentiment", "negative", 0.8), 0.8);
        assert_eq!(crisis_signal("sentiment", "neutral", 0.6), 0.3);
        assert_eq!(crisis_signal("sentiment", "positive", 0.9), 0.0);
    }

    #[test]
    fn irony_signal_is_the_irony_probability() {
        assert_eq!(crisis_signal("irony", "irony", 0.9), 0.9);
        // non_irony at 0.9 confidence means irony probability 0.1
        assert!((crisis_signal("irony", "non_irony", 0.9) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn emotion_positive_set_only() {
        for label in CRISIS_POSITIVE_EMOTIONS {
            assert_eq!(crisis_signal("emotion", label, 0.7), 0.7);
        }
        assert_eq!(crisis_signal("emotion", "joy", 0.9), 0.0);
        assert_eq!(crisis_signal("emotion", "neutral", 0.6), 0.0);
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(crisis_signal("crisis", "crisis", 1.5), 1.0);
        assert_eq!(crisis_signal("crisis", "crisis", -0.5), 0.0);
    }
}
