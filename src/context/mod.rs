//! # Context Analyzer
//!
//! Interprets a client-supplied message history together with the current
//! message's score: escalation trajectory, temporal risk factors, trend, and
//! the resulting intervention urgency. Runs only when a non-empty history was
//! supplied and the request did not opt out.

pub mod escalation;
pub mod temporal;
pub mod trend;
pub mod urgency;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::ensemble::EnsembleEngine;
use crate::models::{
    ContextAnalysisResult, HistoryItem, HistoryMetadata, Severity, TrendDirection,
};

use escalation::Sample;

/// Tolerance before a history timestamp counts as "in the future".
const FUTURE_TOLERANCE_MINUTES: i64 = 5;

/// Consecutive history gaps above this are flagged as implausible.
const MAX_PLAUSIBLE_GAP_HOURS: i64 = 168;

/// The current message as seen by the context analyzer.
#[derive(Debug, Clone, Copy)]
pub struct CurrentMessage {
    pub score: f32,
    pub severity: Severity,
    pub at: DateTime<Utc>,
}

/// Run the full context analysis. History validation issues and re-scoring
/// failures surface as warnings; they never fail the request.
pub async fn analyze(
    engine: &EnsembleEngine,
    history: &[HistoryItem],
    current: CurrentMessage,
    tz: Tz,
    cfg: &DetectionConfig,
) -> (ContextAnalysisResult, Vec<String>) {
    let mut warnings = Vec::new();
    let mut issues = validate_history(history, current.at);

    let mut items: Vec<HistoryItem> = history.to_vec();
    items.sort_by_key(|item| item.timestamp);

    let truncated = items.len() > cfg.context.max_history_size;
    if truncated {
        let drop = items.len() - cfg.context.max_history_size;
        items.drain(..drop);
        issues.push(format!(
            "history exceeded {} items; oldest {} dropped",
            cfg.context.max_history_size, drop
        ));
    }

    // Score series: trust supplied scores, re-score the rest through the
    // ensemble when enabled.
    let mut samples: Vec<Sample> = Vec::with_capacity(items.len() + 1);
    for (index, item) in items.iter().enumerate() {
        let score = match item.crisis_score {
            Some(score) => {
                if !(0.0..=1.0).contains(&score) {
                    issues.push(format!(
                        "history item {index} score {score} outside [0, 1]; clamped"
                    ));
                }
                Some(score.clamp(0.0, 1.0))
            }
            None if cfg.context.rescore_missing => {
                match engine.score_text(&item.message, cfg).await {
                    Ok(score) => Some(score),
                    Err(err) => {
                        warnings.push(format!("failed to re-score history item {index}: {err}"));
                        None
                    }
                }
            }
            None => None,
        };
        if let Some(score) = score {
            samples.push(Sample {
                at: item.timestamp,
                score,
            });
        }
    }
    samples.push(Sample {
        at: current.at,
        score: current.score,
    });

    let escalation = escalation::detect(&samples, current.severity, tz, &cfg.context.escalation);
    debug!(
        rate = %escalation.rate,
        pattern = escalation.matched_pattern.as_deref().unwrap_or("-"),
        "escalation analyzed"
    );

    let timestamps: Vec<DateTime<Utc>> = items.iter().map(|item| item.timestamp).collect();
    let temporal = temporal::analyze(&timestamps, current.at, tz, &cfg.context.temporal);

    let scores: Vec<f32> = samples.iter().map(|s| s.score).collect();
    let trend = trend::analyze(&scores, &cfg.context.trend);

    let intervention_urgency = urgency::calculate(
        current.score,
        current.severity,
        &escalation,
        &temporal,
        &cfg.thresholds,
    );
    let intervention_delayed =
        urgency::intervention_delayed(&scores, &escalation, &cfg.thresholds);

    let trajectory = if escalation.detected {
        "escalating"
    } else {
        match trend.direction {
            TrendDirection::Improving => "improving",
            TrendDirection::Worsening => "worsening",
            TrendDirection::Volatile => "volatile",
            TrendDirection::Stable => "stable",
        }
    }
    .to_string();

    let time_span_hours = items
        .first()
        .map(|item| (current.at - item.timestamp).num_seconds() as f32 / 3600.0)
        .unwrap_or(0.0);

    let result = ContextAnalysisResult {
        escalation,
        temporal,
        trend,
        intervention_urgency,
        trajectory,
        intervention_delayed,
        history_metadata: HistoryMetadata {
            message_count: items.len(),
            truncated,
            time_span_hours,
            issues,
        },
    };
    (result, warnings)
}

fn validate_history(history: &[HistoryItem], now: DateTime<Utc>) -> Vec<String> {
    let mut issues = Vec::new();

    if history
        .windows(2)
        .any(|w| w[1].timestamp < w[0].timestamp)
    {
        issues.push("history timestamps out of order; sorted ascending before analysis".to_string());
    }

    let future_cutoff = now + Duration::minutes(FUTURE_TOLERANCE_MINUTES);
    for (index, item) in history.iter().enumerate() {
        if item.timestamp > future_cutoff {
            issues.push(format!("history item {index} has a future timestamp"));
        }
    }

    let mut sorted: Vec<DateTime<Utc>> = history.iter().map(|item| item.timestamp).collect();
    sorted.sort();
    for w in sorted.windows(2) {
        let gap = w[1] - w[0];
        if gap > Duration::hours(MAX_PLAUSIBLE_GAP_HOURS) {
            issues.push(format!(
                "gap of {}h between history items exceeds {}h",
                gap.num_hours(),
                MAX_PLAUSIBLE_GAP_HOURS
            ));
            break;
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InterventionUrgency;
    use chrono::TimeZone;

    fn item(hour: u32, minute: u32, score: Option<f32>) -> HistoryItem {
        HistoryItem {
            message: "earlier message".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 7, 10, hour, minute, 0).unwrap(),
            crisis_score: score,
        }
    }

    fn current(hour: u32, score: f32, severity: Severity) -> CurrentMessage {
        CurrentMessage {
            score,
            severity,
            at: Utc.with_ymd_and_hms(2026, 7, 10, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn evening_escalation_reaches_immediate() {
        let engine = EnsembleEngine::new();
        let cfg = DetectionConfig::default();
        let history = vec![
            item(16, 0, Some(0.25)),
            item(18, 0, Some(0.45)),
            item(20, 0, Some(0.70)),
        ];
        let (result, warnings) = analyze(
            &engine,
            &history,
            current(22, 0.91, Severity::Critical),
            chrono_tz::UTC,
            &cfg,
        )
        .await;

        assert!(warnings.is_empty());
        assert!(result.escalation.detected);
        assert_eq!(result.escalation.rate, crate::models::EscalationRate::Rapid);
        assert_eq!(
            result.escalation.matched_pattern.as_deref(),
            Some("evening_deterioration")
        );
        assert_eq!(result.trend.direction, TrendDirection::Worsening);
        assert_eq!(result.trend.velocity, crate::models::TrendVelocity::Rapid);
        assert_eq!(result.intervention_urgency, InterventionUrgency::Immediate);
        assert_eq!(result.trajectory, "escalating");
    }

    #[tokio::test]
    async fn single_item_history_is_quiet() {
        let engine = EnsembleEngine::new();
        let cfg = DetectionConfig::default();
        let history = vec![item(10, 0, Some(0.3))];
        let (result, _) = analyze(
            &engine,
            &history,
            current(14, 0.35, Severity::Safe),
            chrono_tz::UTC,
            &cfg,
        )
        .await;

        assert!(!result.escalation.detected);
        assert_eq!(result.escalation.rate, crate::models::EscalationRate::None);
        assert_eq!(result.trend.direction, TrendDirection::Stable);
        assert_eq!(result.history_metadata.message_count, 1);
    }

    #[tokio::test]
    async fn out_of_order_history_is_sorted_and_flagged() {
        let engine = EnsembleEngine::new();
        let cfg = DetectionConfig::default();
        let history = vec![
            item(20, 0, Some(0.7)),
            item(16, 0, Some(0.25)),
            item(18, 0, Some(0.45)),
        ];
        let (result, _) = analyze(
            &engine,
            &history,
            current(22, 0.9, Severity::Critical),
            chrono_tz::UTC,
            &cfg,
        )
        .await;

        assert!(
            result
                .history_metadata
                .issues
                .iter()
                .any(|issue| issue.contains("out of order"))
        );
        // Sorted ascending: still detected as an escalation.
        assert!(result.escalation.detected);
        assert!(result.escalation.score_delta > 0.0);
    }

    #[tokio::test]
    async fn oversized_history_keeps_newest_items() {
        let engine = EnsembleEngine::new();
        let mut cfg = DetectionConfig::default();
        cfg.context.max_history_size = 3;
        let history = vec![
            item(10, 0, Some(0.2)),
            item(12, 0, Some(0.3)),
            item(14, 0, Some(0.4)),
            item(16, 0, Some(0.5)),
            item(18, 0, Some(0.6)),
        ];
        let (result, _) = analyze(
            &engine,
            &history,
            current(20, 0.7, Severity::High),
            chrono_tz::UTC,
            &cfg,
        )
        .await;

        assert_eq!(result.history_metadata.message_count, 3);
        assert!(result.history_metadata.truncated);
        // Oldest dropped: the retained window starts at 14:00.
        assert!((result.history_metadata.time_span_hours - 6.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn out_of_range_scores_are_clamped_with_issue() {
        let engine = EnsembleEngine::new();
        let cfg = DetectionConfig::default();
        let history = vec![
            item(10, 0, Some(1.7)),
            item(12, 0, Some(0.4)),
            item(14, 0, Some(0.5)),
        ];
        let (result, _) = analyze(
            &engine,
            &history,
            current(16, 0.5, Severity::Medium),
            chrono_tz::UTC,
            &cfg,
        )
        .await;

        assert!(
            result
                .history_metadata
                .issues
                .iter()
                .any(|issue| issue.contains("clamped"))
        );
        assert!(result.trend.scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[tokio::test]
    async fn missing_scores_are_rescored_through_the_ensemble() {
        let engine = EnsembleEngine::new();
        let cfg = DetectionConfig::default();
        let history = vec![
            item(10, 0, None),
            item(12, 0, Some(0.4)),
            item(14, 0, None),
        ];
        let (result, warnings) = analyze(
            &engine,
            &history,
            current(16, 0.5, Severity::Medium),
            chrono_tz::UTC,
            &cfg,
        )
        .await;

        assert!(warnings.is_empty());
        // All three history items plus the current message are in the series.
        assert_eq!(result.trend.scores.len(), 4);
    }

    #[tokio::test]
    async fn late_night_burst_boosts_urgency() {
        let engine = EnsembleEngine::new();
        let cfg = DetectionConfig::default();
        // Five messages in twenty minutes, 02:00-02:20 UTC.
        let history: Vec<HistoryItem> = (0..4)
            .map(|i| HistoryItem {
                message: "still up".to_string(),
                timestamp: Utc
                    .with_ymd_and_hms(2026, 7, 10, 2, 5 * i, 0)
                    .unwrap(),
                crisis_score: Some(0.4 + 0.03 * i as f32),
            })
            .collect();
        let current = CurrentMessage {
            score: 0.55,
            severity: Severity::Medium,
            at: Utc.with_ymd_and_hms(2026, 7, 10, 2, 20, 0).unwrap(),
        };
        let (result, _) = analyze(&engine, &history, current, chrono_tz::UTC, &cfg).await;

        assert!(result.temporal.late_night_risk);
        assert!(result.temporal.rapid_posting);
        assert!(result.temporal.risk_modifier >= 1.44 - 1e-3);
        assert!(result.intervention_urgency >= InterventionUrgency::High);
    }
}
