//! The assessment produced by the engine and returned to callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::context::ContextAnalysisResult;
use super::enums::{InterventionUrgency, RecommendedAction, Severity};
use super::signal::{ConflictResult, ConsensusResult, ModelSignal};

/// Natural-language explanation of an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Explanation {
    /// One-paragraph summary.
    pub summary: String,
    /// Bulleted key factors behind the score.
    pub key_factors: Vec<String>,
    /// Recommended-action block.
    pub recommendation: String,
}

/// Complete crisis assessment for a single message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CrisisAssessment {
    /// True when severity reached the configured minimum (low by default).
    pub crisis_detected: bool,
    pub severity: Severity,
    /// Final crisis score in [0, 1] after any conflict adjustment.
    pub crisis_score: f32,
    /// Agreement combined with inverse conflict variance, in [0, 1].
    pub confidence: f32,
    /// True when intervention urgency reached at least `standard`.
    pub requires_intervention: bool,
    pub intervention_urgency: InterventionUrgency,
    pub recommended_action: RecommendedAction,
    /// Per-model signals; models that failed are absent.
    pub signals: BTreeMap<String, ModelSignal>,
    pub consensus: ConsensusResult,
    pub conflict_analysis: ConflictResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_analysis: Option<ContextAnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}
