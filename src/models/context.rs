//! History and context-analysis result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enums::{EscalationRate, InterventionUrgency, TrendDirection, TrendVelocity};

/// One prior message supplied by the client for context analysis.
///
/// The service never stores history; items live only for the duration of the
/// request that carried them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    /// Message text.
    pub message: String,
    /// When the message was posted (ISO-8601; naive values are read as UTC).
    pub timestamp: DateTime<Utc>,
    /// Previously computed crisis score in [0, 1], if the client kept one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crisis_score: Option<f32>,
}

/// Output of the escalation detector.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EscalationResult {
    pub detected: bool,
    pub rate: EscalationRate,
    /// Confidence in [0, 1] that the detected trajectory is real.
    pub confidence: f32,
    /// Best-matching named pattern, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    /// Score change from the first valid sample to the last.
    pub score_delta: f32,
    /// Hours covered by the retained history window.
    pub time_span_hours: f32,
}

impl EscalationResult {
    pub fn none() -> Self {
        Self {
            detected: false,
            rate: EscalationRate::None,
            confidence: 0.0,
            matched_pattern: None,
            score_delta: 0.0,
            time_span_hours: 0.0,
        }
    }
}

/// Output of the temporal risk detector.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemporalResult {
    /// Current message falls in the configured late-night window.
    pub late_night_risk: bool,
    /// Enough messages landed inside the rapid-posting window.
    pub rapid_posting: bool,
    /// Saturday or Sunday in the user's local time.
    pub is_weekend: bool,
    /// Hour of day (0-23) of the current message in local time.
    pub hour_of_day: u32,
    /// Multiplicative risk modifier, >= 1.0.
    pub risk_modifier: f32,
    /// Timezone actually used for local-time features.
    #[schema(example = "America/New_York")]
    pub user_timezone: String,
}

/// Output of the trend analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub velocity: TrendVelocity,
    /// Raw score series, oldest first, current message last.
    pub scores: Vec<f32>,
    pub start_score: f32,
    pub end_score: f32,
    /// Maximum of the raw scores.
    pub peak_score: f32,
    /// Indices of local extrema in the smoothed series.
    pub inflection_points: Vec<usize>,
}

/// Metadata about the history the analyzer actually worked with.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryMetadata {
    /// Items retained after truncation to the configured window.
    pub message_count: usize,
    /// True when the supplied history exceeded the window and was truncated.
    pub truncated: bool,
    /// Hours between the oldest retained item and the current message.
    pub time_span_hours: f32,
    /// Non-fatal validation issues found in the supplied history.
    pub issues: Vec<String>,
}

/// Full context analysis attached to an assessment when history was supplied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContextAnalysisResult {
    pub escalation: EscalationResult,
    pub temporal: TemporalResult,
    pub trend: TrendResult,
    pub intervention_urgency: InterventionUrgency,
    /// One-word summary of the user's trajectory.
    #[schema(example = "escalating")]
    pub trajectory: String,
    /// Set when an earlier point in the series already warranted intervention.
    pub intervention_delayed: bool,
    pub history_metadata: HistoryMetadata,
}
