//! Escalation detector: classifies the trajectory of a score series as
//! none/gradual/rapid/sudden and matches known named patterns.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::EscalationConfig;
use crate::ensemble::consensus::variance;
use crate::models::{EscalationRate, EscalationResult, Severity};

/// One sample of the score series: a timestamp plus the crisis score.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub score: f32,
}

/// Detect escalation over the (ascending) sample series. The last sample is
/// the current message. `current_severity` selects the optional per-severity
/// threshold preset.
pub fn detect(
    samples: &[Sample],
    current_severity: Severity,
    tz: Tz,
    cfg: &EscalationConfig,
) -> EscalationResult {
    // A single prior message cannot establish a trajectory.
    if samples.len() < 3 {
        return EscalationResult::none();
    }

    let first = samples[0];
    let last = samples[samples.len() - 1];
    let score_delta = last.score - first.score;
    let time_span_hours = hours_between(first.at, last.at);

    // Per-severity presets make detection more sensitive for already-elevated
    // users by scaling every tier proportionally.
    let scale = cfg
        .per_severity_thresholds
        .get(&current_severity)
        .map(|preset| preset / cfg.rapid_threshold)
        .unwrap_or(1.0);
    let sudden_threshold = cfg.sudden_threshold * scale;
    let rapid_threshold = cfg.rapid_threshold * scale;
    let gradual_threshold = cfg.gradual_threshold * scale;

    // Each tier looks at the trailing window of its configured width, so an
    // old calm sample does not mask a fresh spike.
    let rate = if windowed_delta(samples, cfg.sudden_window_hours, true) >= sudden_threshold {
        EscalationRate::Sudden
    } else if windowed_delta(samples, cfg.rapid_window_hours, false) >= rapid_threshold {
        EscalationRate::Rapid
    } else if samples.len() >= cfg.minimum_messages
        && time_span_hours <= cfg.gradual_window_hours
        && score_delta >= gradual_threshold
    {
        EscalationRate::Gradual
    } else {
        EscalationRate::None
    };

    if rate == EscalationRate::None {
        return EscalationResult {
            detected: false,
            rate,
            confidence: 0.0,
            matched_pattern: match_pattern(samples, tz, cfg),
            score_delta,
            time_span_hours,
        };
    }

    let deltas: Vec<f32> = samples.windows(2).map(|w| w[1].score - w[0].score).collect();
    let magnitude = (score_delta.abs() * 2.0).min(1.0);
    let sample_factor = (samples.len() as f32 / cfg.minimum_messages as f32).min(1.0);
    let consistency = 1.0 / (1.0 + 10.0 * variance(&deltas));
    let confidence = (magnitude * sample_factor * consistency).clamp(0.0, 1.0);

    EscalationResult {
        detected: true,
        rate,
        confidence,
        matched_pattern: match_pattern(samples, tz, cfg),
        score_delta,
        time_span_hours,
    }
}

/// Score rise within the trailing window of `window_hours`. `strict` keeps
/// the window open-ended (`<`), matching the sudden tier's "< 1 hour".
fn windowed_delta(samples: &[Sample], window_hours: f32, strict: bool) -> f32 {
    let last = samples[samples.len() - 1];
    let base = samples.iter().find(|s| {
        let age = hours_between(s.at, last.at);
        if strict { age < window_hours } else { age <= window_hours }
    });
    match base {
        Some(first_in_window) if first_in_window.at < last.at => last.score - first_in_window.score,
        _ => 0.0,
    }
}

fn hours_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f32 {
    (b - a).num_seconds() as f32 / 3600.0
}

// ── Named pattern library ──────────────────────────────────────────────

/// Minimum confidence for a pattern to be reported.
const PATTERN_FLOOR: f32 = 0.4;

fn match_pattern(samples: &[Sample], tz: Tz, cfg: &EscalationConfig) -> Option<String> {
    let candidates = [
        ("evening_deterioration", evening_deterioration(samples, tz)),
        ("sudden_spike", sudden_spike(samples)),
        ("post_rejection_spiral", post_rejection_spiral(samples)),
        ("chronic_low_grade", chronic_low_grade(samples, cfg)),
    ];
    candidates
        .iter()
        .filter(|(_, confidence)| *confidence >= PATTERN_FLOOR)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name.to_string())
}

/// Monotonic rise ending in the local evening or night hours.
fn evening_deterioration(samples: &[Sample], tz: Tz) -> f32 {
    if samples.len() < 3 {
        return 0.0;
    }
    let monotonic = samples.windows(2).all(|w| w[1].score >= w[0].score - 0.02);
    if !monotonic {
        return 0.0;
    }
    let delta = samples[samples.len() - 1].score - samples[0].score;
    if delta < 0.15 {
        return 0.0;
    }
    let hour = samples[samples.len() - 1].at.with_timezone(&tz).hour();
    if (18..24).contains(&hour) || hour < 2 {
        (delta * 2.0).min(1.0) * 0.9
    } else {
        0.0
    }
}

/// A jump of at least 0.4 within the last hour of the series.
fn sudden_spike(samples: &[Sample]) -> f32 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let last_delta = samples[n - 1].score - samples[n - 2].score;
    let gap = hours_between(samples[n - 2].at, samples[n - 1].at);
    if last_delta >= 0.4 && gap < 1.0 {
        last_delta.min(1.0)
    } else {
        0.0
    }
}

/// A calm plateau followed by a sharp final jump.
fn post_rejection_spiral(samples: &[Sample]) -> f32 {
    let n = samples.len();
    if n < 3 {
        return 0.0;
    }
    let plateau: Vec<f32> = samples[..n - 1].iter().map(|s| s.score).collect();
    let plateau_mean = plateau.iter().sum::<f32>() / plateau.len() as f32;
    let last_delta = samples[n - 1].score - samples[n - 2].score;
    if plateau_mean < 0.4 && variance(&plateau) < 0.01 && last_delta >= 0.3 {
        (last_delta * 1.5).min(1.0)
    } else {
        0.0
    }
}

/// Sustained mid-band scores with little movement over a longer window.
fn chronic_low_grade(samples: &[Sample], cfg: &EscalationConfig) -> f32 {
    if samples.len() < cfg.minimum_messages {
        return 0.0;
    }
    let scores: Vec<f32> = samples.iter().map(|s| s.score).collect();
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    let delta = (scores[scores.len() - 1] - scores[0]).abs();
    if (0.3..=0.6).contains(&mean) && delta < 0.1 && variance(&scores) < 0.02 {
        0.5 + (0.6 - (mean - 0.45).abs())
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(hour: u32, minute: u32, score: f32) -> Sample {
        Sample {
            at: Utc.with_ymd_and_hms(2026, 7, 10, hour, minute, 0).unwrap(),
            score,
        }
    }

    fn cfg() -> EscalationConfig {
        EscalationConfig::default()
    }

    #[test]
    fn empty_or_single_history_detects_nothing() {
        let result = detect(&[], Severity::Medium, chrono_tz::UTC, &cfg());
        assert!(!result.detected);
        let result = detect(&[sample(10, 0, 0.5)], Severity::Medium, chrono_tz::UTC, &cfg());
        assert!(!result.detected);
        assert_eq!(result.rate, EscalationRate::None);
    }

    #[test]
    fn evening_rise_is_rapid_with_pattern() {
        let samples = vec![
            sample(16, 0, 0.25),
            sample(18, 0, 0.45),
            sample(20, 0, 0.70),
            sample(22, 0, 0.92),
        ];
        let result = detect(&samples, Severity::Critical, chrono_tz::UTC, &cfg());
        assert!(result.detected);
        assert_eq!(result.rate, EscalationRate::Rapid);
        assert_eq!(result.matched_pattern.as_deref(), Some("evening_deterioration"));
        assert!(result.score_delta > 0.6);
        assert!((result.time_span_hours - 6.0).abs() < 0.01);
        assert!(result.confidence > 0.3);
    }

    #[test]
    fn fresh_spike_within_the_hour_is_sudden() {
        let samples = vec![
            sample(12, 0, 0.2),
            sample(12, 20, 0.25),
            sample(12, 50, 0.75),
        ];
        let result = detect(&samples, Severity::Medium, chrono_tz::UTC, &cfg());
        assert_eq!(result.rate, EscalationRate::Sudden);
        assert!(result.detected);
    }

    #[test]
    fn slow_drift_over_a_day_is_gradual() {
        let samples = vec![
            sample(1, 0, 0.2),
            sample(9, 0, 0.3),
            sample(17, 0, 0.38),
            sample(23, 0, 0.45),
        ];
        let result = detect(&samples, Severity::Medium, chrono_tz::UTC, &cfg());
        assert_eq!(result.rate, EscalationRate::Gradual);
    }

    #[test]
    fn flat_series_is_none() {
        let samples = vec![sample(10, 0, 0.3), sample(12, 0, 0.32), sample(14, 0, 0.31)];
        let result = detect(&samples, Severity::Low, chrono_tz::UTC, &cfg());
        assert!(!result.detected);
        assert_eq!(result.rate, EscalationRate::None);
    }

    #[test]
    fn severity_presets_lower_the_bar_for_elevated_users() {
        let cfg = EscalationConfig::with_severity_presets();
        // A 0.18 rise in two hours: below the default 0.3 rapid threshold but
        // above the critical preset of 0.15.
        let samples = vec![sample(10, 0, 0.70), sample(11, 30, 0.82), sample(12, 0, 0.88)];
        let relaxed = detect(&samples, Severity::Critical, chrono_tz::UTC, &cfg);
        assert_eq!(relaxed.rate, EscalationRate::Rapid);

        let strict = detect(&samples, Severity::Low, chrono_tz::UTC, &cfg);
        assert_eq!(strict.rate, EscalationRate::None);
    }

    #[test]
    fn plateau_then_jump_matches_spiral() {
        let samples = vec![
            sample(8, 0, 0.2),
            sample(10, 0, 0.22),
            sample(12, 0, 0.21),
            sample(13, 30, 0.65),
        ];
        let result = detect(&samples, Severity::Medium, chrono_tz::UTC, &cfg());
        assert_eq!(result.matched_pattern.as_deref(), Some("post_rejection_spiral"));
    }

    #[test]
    fn chronic_mid_band_matches_low_grade() {
        let samples = vec![
            sample(8, 0, 0.45),
            sample(12, 0, 0.48),
            sample(16, 0, 0.44),
            sample(20, 0, 0.47),
        ];
        let result = detect(&samples, Severity::Medium, chrono_tz::UTC, &cfg());
        assert_eq!(result.matched_pattern.as_deref(), Some("chronic_low_grade"));
        assert!(!result.detected);
    }
}
