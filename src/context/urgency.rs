//! Intervention urgency calculator: folds crisis score, escalation and
//! temporal factors into one operator-facing action level.

use crate::config::SeverityThresholds;
use crate::models::{
    EscalationRate, EscalationResult, InterventionUrgency, Severity, TemporalResult,
};

/// Compute the intervention urgency.
///
/// Base mapping comes from the severity; the boost rules apply in order and
/// are monotone (each can only raise the level, capped at `immediate`):
///
/// 1. sudden or rapid escalation
/// 2. late-night risk while the score is at least in the medium band
/// 3. rapid posting
pub fn calculate(
    crisis_score: f32,
    severity: Severity,
    escalation: &EscalationResult,
    temporal: &TemporalResult,
    thresholds: &SeverityThresholds,
) -> InterventionUrgency {
    let mut urgency = InterventionUrgency::base_for(severity);

    if matches!(
        escalation.rate,
        EscalationRate::Sudden | EscalationRate::Rapid
    ) {
        urgency = urgency.boost();
    }
    if temporal.late_night_risk && crisis_score >= thresholds.medium {
        urgency = urgency.boost();
    }
    if temporal.rapid_posting {
        urgency = urgency.boost();
    }

    urgency
}

/// Whether intervention should already have happened earlier in the series:
/// true when some position before the current message was at or above the
/// high threshold while escalation is underway.
pub fn intervention_delayed(
    scores: &[f32],
    escalation: &EscalationResult,
    thresholds: &SeverityThresholds,
) -> bool {
    if !escalation.detected || scores.len() < 2 {
        return false;
    }
    scores[..scores.len() - 1]
        .iter()
        .any(|score| *score >= thresholds.high)
}
