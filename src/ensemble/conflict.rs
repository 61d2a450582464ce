//! Conflict layer: detects and classifies disagreement among model signals.
//!
//! Annotate-only by default; `median_pull_on_mismatch` opts into pulling the
//! weighted score halfway toward the per-model median on a label mismatch.

use crate::config::ConflictConfig;
use crate::models::{ConflictKind, ConflictResult, ModelSignal};

use super::consensus::variance;

/// A model's view for conflict purposes: the reported signal (dampened) plus
/// the original label for the resolution note.
#[derive(Debug, Clone)]
pub struct ConflictInput<'a> {
    pub signal: &'a ModelSignal,
    pub damped: f32,
}

/// Analyze disagreement across the contributing (non-dampener) models.
pub fn analyze(
    inputs: &[ConflictInput<'_>],
    weighted_score: f32,
    primary_model: Option<&str>,
    positive_threshold: f32,
    cfg: &ConflictConfig,
) -> ConflictResult {
    if inputs.len() < 2 {
        return ConflictResult::none();
    }

    let values: Vec<f32> = inputs.iter().map(|i| i.damped).collect();
    let var = variance(&values);
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    let min = values.iter().cloned().fold(f32::MAX, f32::min);
    let delta = max - min;

    let strong_positive: Vec<&ConflictInput<'_>> = inputs
        .iter()
        .filter(|i| i.damped >= cfg.strong_positive)
        .collect();
    let strong_negative: Vec<&ConflictInput<'_>> = inputs
        .iter()
        .filter(|i| i.damped <= cfg.strong_negative)
        .collect();
    let polarity_split = !strong_positive.is_empty() && !strong_negative.is_empty();

    let detected = var >= cfg.disagreement_threshold || polarity_split;
    if !detected {
        return ConflictResult {
            detected: false,
            kind: ConflictKind::None,
            variance: var,
            delta,
            resolution: None,
            score_adjustment: None,
        };
    }

    let primary_flip = primary_model.is_some_and(|primary| {
        inputs
            .iter()
            .find(|i| i.signal.model_id == primary)
            .map(|i| (i.damped > positive_threshold) != (weighted_score > positive_threshold))
            .unwrap_or(false)
    });

    let kind = if polarity_split {
        ConflictKind::LabelMismatch
    } else if primary_flip {
        ConflictKind::SignFlip
    } else {
        ConflictKind::ScoreVariance
    };

    let (resolution, score_adjustment) = match kind {
        ConflictKind::LabelMismatch => {
            let pos_names: Vec<&str> = strong_positive
                .iter()
                .map(|i| i.signal.model_id.as_str())
                .collect();
            let neg_names: Vec<&str> = strong_negative
                .iter()
                .map(|i| i.signal.model_id.as_str())
                .collect();
            if cfg.median_pull_on_mismatch {
                let med = median(&values);
                let adjusted = (weighted_score + med) / 2.0;
                (
                    format!(
                        "{} read crisis while {} read safe; score pulled toward the model median",
                        pos_names.join(", "),
                        neg_names.join(", "),
                    ),
                    Some(adjusted.clamp(0.0, 1.0)),
                )
            } else {
                (
                    format!(
                        "{} read crisis while {} read safe; keeping the weighted score",
                        pos_names.join(", "),
                        neg_names.join(", "),
                    ),
                    None,
                )
            }
        }
        ConflictKind::SignFlip => (
            format!(
                "primary model '{}' disagrees with the weighted consensus about crossing {:.2}",
                primary_model.unwrap_or("?"),
                positive_threshold,
            ),
            None,
        ),
        _ => (
            format!("model signals spread by {delta:.2} (variance {var:.3}) but polarities agree"),
            None,
        ),
    };

    ConflictResult {
        detected: true,
        kind,
        variance: var,
        delta,
        resolution: Some(resolution),
        score_adjustment,
    }
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(model_id: &str, label: &str, crisis_signal: f32) -> ModelSignal {
        ModelSignal {
            model_id: model_id.to_string(),
            label: label.to_string(),
            score: crisis_signal,
            crisis_signal,
            weight: 0.33,
            was_truncated: false,
        }
    }

    fn inputs(signals: &[ModelSignal]) -> Vec<ConflictInput<'_>> {
        signals
            .iter()
            .map(|s| ConflictInput {
                signal: s,
                damped: s.crisis_signal,
            })
            .collect()
    }

    #[test]
    fn agreement_is_not_a_conflict() {
        let signals = vec![signal("crisis", "crisis", 0.8), signal("sentiment", "negative", 0.75)];
        let result = analyze(
            &inputs(&signals),
            0.78,
            Some("crisis"),
            0.5,
            &ConflictConfig::default(),
        );
        assert!(!result.detected);
        assert_eq!(result.kind, ConflictKind::None);
    }

    #[test]
    fn opposed_strong_signals_classify_as_label_mismatch() {
        let signals = vec![
            signal("crisis", "crisis", 0.9),
            signal("sentiment", "positive", 0.0),
            signal("emotion", "joy", 0.05),
        ];
        let result = analyze(
            &inputs(&signals),
            0.45,
            Some("crisis"),
            0.5,
            &ConflictConfig::default(),
        );
        assert!(result.detected);
        assert_eq!(result.kind, ConflictKind::LabelMismatch);
        assert!(result.resolution.is_some());
        // Annotate only by default.
        assert!(result.score_adjustment.is_none());
    }

    #[test]
    fn median_pull_adjusts_when_opted_in() {
        let cfg = ConflictConfig {
            median_pull_on_mismatch: true,
            ..ConflictConfig::default()
        };
        let signals = vec![
            signal("crisis", "crisis", 0.9),
            signal("sentiment", "positive", 0.0),
            signal("emotion", "joy", 0.1),
        ];
        let result = analyze(&inputs(&signals), 0.5, Some("crisis"), 0.5, &cfg);
        assert_eq!(result.kind, ConflictKind::LabelMismatch);
        let adjusted = result.score_adjustment.expect("adjustment");
        // Median is 0.1, so the score is pulled to (0.5 + 0.1) / 2.
        assert!((adjusted - 0.3).abs() < 1e-6);
    }

    #[test]
    fn moderate_spread_is_score_variance() {
        let signals = vec![
            signal("crisis", "distress", 0.55),
            signal("sentiment", "negative", 0.25),
            signal("emotion", "sadness", 0.22),
        ];
        let cfg = ConflictConfig {
            disagreement_threshold: 0.02,
            ..ConflictConfig::default()
        };
        let result = analyze(&inputs(&signals), 0.34, Some("sentiment"), 0.5, &cfg);
        assert!(result.detected);
        assert_eq!(result.kind, ConflictKind::ScoreVariance);
    }

    #[test]
    fn primary_disagreement_is_sign_flip() {
        // Primary above the positive threshold, consensus below, no strong
        // negative camp (sentiment at 0.3 is not <= 0.2).
        let signals = vec![
            signal("crisis", "crisis", 0.75),
            signal("sentiment", "neutral", 0.3),
            signal("emotion", "sadness", 0.28),
        ];
        let cfg = ConflictConfig {
            disagreement_threshold: 0.04,
            ..ConflictConfig::default()
        };
        let result = analyze(&inputs(&signals), 0.44, Some("crisis"), 0.5, &cfg);
        assert!(result.detected);
        assert_eq!(result.kind, ConflictKind::SignFlip);
    }

    #[test]
    fn single_signal_never_conflicts() {
        let signals = vec![signal("crisis", "crisis", 0.9)];
        let result = analyze(
            &inputs(&signals),
            0.9,
            Some("crisis"),
            0.5,
            &ConflictConfig::default(),
        );
        assert!(!result.detected);
    }
}
