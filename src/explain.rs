//! Explanation builder: turns an assessment into a verbosity-tunable
//! operator-facing summary. Output stays within embed limits so the alerter
//! can reuse it verbatim.

use crate::models::{CrisisAssessment, Explanation, RecommendedAction, Verbosity};

/// Upper bound on the summary text so it can be embedded in alerts.
const SUMMARY_LIMIT: usize = 4096;

/// Build the explanation for a finished assessment.
pub fn build(assessment: &CrisisAssessment, verbosity: Verbosity) -> Explanation {
    let severity = assessment.severity;
    let mut summary = format!(
        "Severity {} with a crisis score of {:.2} (confidence {:.2}).",
        severity, assessment.crisis_score, assessment.confidence
    );

    if verbosity != Verbosity::Minimal {
        let top = top_signals(assessment, 2);
        if !top.is_empty() {
            summary.push_str(&format!(" Strongest signals: {}.", top.join(", ")));
        }
        if let Some(context) = &assessment.context_analysis {
            if context.escalation.detected {
                summary.push_str(&format!(
                    " The recent history shows {} escalation over {:.1}h.",
                    context.escalation.rate, context.escalation.time_span_hours
                ));
            } else {
                summary.push_str(&format!(" Trajectory: {}.", context.trajectory));
            }
        }
    }
    summary.truncate(SUMMARY_LIMIT);

    let mut key_factors = Vec::new();
    for (model_id, signal) in &assessment.signals {
        if signal.crisis_signal >= 0.2 && model_id != "irony" {
            key_factors.push(format!(
                "{} read \"{}\" at {:.2}",
                model_id, signal.label, signal.crisis_signal
            ));
        }
    }
    if let Some(irony) = assessment.signals.get("irony") {
        if irony.crisis_signal >= 0.5 {
            key_factors.push(format!(
                "irony detected at {:.2}; other signals dampened",
                irony.crisis_signal
            ));
        }
    }
    if assessment.conflict_analysis.detected {
        if let Some(resolution) = &assessment.conflict_analysis.resolution {
            key_factors.push(format!("model disagreement: {resolution}"));
        }
    }
    if let Some(context) = &assessment.context_analysis {
        if let Some(pattern) = &context.escalation.matched_pattern {
            key_factors.push(format!("matched pattern: {pattern}"));
        }
        if context.temporal.late_night_risk {
            key_factors.push(format!(
                "posted late at night (local hour {})",
                context.temporal.hour_of_day
            ));
        }
        if context.temporal.rapid_posting {
            key_factors.push("rapid posting burst in the last half hour".to_string());
        }
        if context.intervention_delayed {
            key_factors.push("earlier messages already warranted intervention".to_string());
        }
    }
    if verbosity != Verbosity::Detailed {
        key_factors.truncate(4);
    }

    let recommendation = match assessment.recommended_action {
        RecommendedAction::ImmediateOutreach => {
            "Reach out to the user now and loop in the on-call responder."
        }
        RecommendedAction::PriorityResponse => {
            "Respond with priority; a team member should engage within the hour."
        }
        RecommendedAction::Watch => "Keep the conversation on the watch list and re-check soon.",
        RecommendedAction::Observe => "No action needed beyond passive observation.",
        RecommendedAction::None => "No intervention indicated.",
    }
    .to_string();

    Explanation {
        summary,
        key_factors,
        recommendation,
    }
}

/// The model ids contributing most to the score, strongest first.
fn top_signals(assessment: &CrisisAssessment, count: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, f32)> = assessment
        .signals
        .iter()
        .filter(|(id, _)| id.as_str() != "irony")
        .map(|(id, signal)| (id, signal.crisis_signal * signal.weight))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(count)
        .filter(|(_, contribution)| *contribution > 0.0)
        .map(|(id, _)| id.clone())
        .collect()
}
