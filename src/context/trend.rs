//! Trend analyzer: classifies direction and velocity of the score series
//! from smoothed consecutive differences.

use crate::config::TrendConfig;
use crate::models::{TrendDirection, TrendResult, TrendVelocity};

/// Analyze the raw score series (oldest first, current message last).
///
/// Scores are smoothed with a short trailing moving average before
/// classification; smoothing lowers peak values (a sharp 1.0 peak smooths
/// toward ~0.75 with the default window) but preserves direction.
pub fn analyze(scores: &[f32], cfg: &TrendConfig) -> TrendResult {
    if scores.is_empty() {
        return TrendResult {
            direction: TrendDirection::Stable,
            velocity: TrendVelocity::None,
            scores: Vec::new(),
            start_score: 0.0,
            end_score: 0.0,
            peak_score: 0.0,
            inflection_points: Vec::new(),
        };
    }

    // Two points cannot distinguish a trend from noise.
    if scores.len() < 3 {
        return TrendResult {
            direction: TrendDirection::Stable,
            velocity: TrendVelocity::None,
            scores: scores.to_vec(),
            start_score: scores[0],
            end_score: scores[scores.len() - 1],
            peak_score: scores.iter().cloned().fold(0.0f32, f32::max),
            inflection_points: Vec::new(),
        };
    }

    let smoothed = smooth(scores, cfg.smoothing_window);
    let net = smoothed[smoothed.len() - 1] - smoothed[0];

    let deltas: Vec<f32> = smoothed.windows(2).map(|w| w[1] - w[0]).collect();
    let max_swing = deltas.iter().map(|d| d.abs()).fold(0.0f32, f32::max);

    let direction = if net >= cfg.worsening_threshold {
        TrendDirection::Worsening
    } else if net <= cfg.improving_threshold {
        TrendDirection::Improving
    } else if max_swing > cfg.volatility_threshold {
        TrendDirection::Volatile
    } else {
        TrendDirection::Stable
    };

    let mean_swing = if deltas.is_empty() {
        0.0
    } else {
        deltas.iter().map(|d| d.abs()).sum::<f32>() / deltas.len() as f32
    };
    let velocity = if mean_swing >= cfg.rapid_velocity {
        TrendVelocity::Rapid
    } else if mean_swing >= cfg.moderate_velocity {
        TrendVelocity::Moderate
    } else if mean_swing >= cfg.gradual_velocity {
        TrendVelocity::Gradual
    } else {
        TrendVelocity::None
    };

    TrendResult {
        direction,
        velocity,
        start_score: scores[0],
        end_score: scores[scores.len() - 1],
        peak_score: scores.iter().cloned().fold(0.0f32, f32::max),
        inflection_points: inflections(&smoothed),
        scores: scores.to_vec(),
    }
}

/// Trailing moving average of width `window`.
fn smooth(scores: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);
    scores
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &scores[start..=i];
            slice.iter().sum::<f32>() / slice.len() as f32
        })
        .collect()
}

/// Indices of strict local extrema in the smoothed series.
fn inflections(smoothed: &[f32]) -> Vec<usize> {
    let mut points = Vec::new();
    for i in 1..smoothed.len().saturating_sub(1) {
        let (prev, here, next) = (smoothed[i - 1], smoothed[i], smoothed[i + 1]);
        if (here > prev && here > next) || (here < prev && here < next) {
            points.push(i);
        }
    }
    points
}
