//! Per-model signal and fusion result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enums::{ConflictKind, ConsensusAlgorithm, Severity};

/// Normalized output of one model wrapper for one message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelSignal {
    /// Stable identifier of the underlying model.
    #[schema(example = "crisis")]
    pub model_id: String,
    /// Top label emitted by the classifier.
    #[schema(example = "crisis")]
    pub label: String,
    /// Probability of the top label, in [0, 1].
    pub score: f32,
    /// Normalized crisis indicator in [0, 1]; higher is more crisis-indicative.
    pub crisis_signal: f32,
    /// Weight of this model in the ensemble, in [0, 1].
    pub weight: f32,
    /// Whether the input was truncated to fit the model's token budget.
    pub was_truncated: bool,
}

/// Weighted fusion of all available model signals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnsembleScore {
    /// Weighted score in [0, 1] with the irony dampener applied.
    pub weighted_score: f32,
    /// Signals keyed by model id; models that failed are absent.
    pub signals: BTreeMap<String, ModelSignal>,
}

/// Result of the consensus voting layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsensusResult {
    /// Algorithm that produced this consensus.
    pub algorithm: ConsensusAlgorithm,
    /// Fused score in [0, 1].
    pub consensus_score: f32,
    /// Severity bucket implied by the consensus score.
    pub consensus_label: Severity,
    /// Agreement measure in [0, 1]; 1.0 means the models fully agree.
    pub agreement: f32,
    /// Per-model vote weight actually applied by the algorithm.
    pub vote_weights: BTreeMap<String, f32>,
}

/// Result of the conflict detection layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConflictResult {
    pub detected: bool,
    pub kind: ConflictKind,
    /// Population variance across per-model crisis signals.
    pub variance: f32,
    /// Spread between the strongest and weakest crisis signal.
    pub delta: f32,
    /// Human-readable note describing how the conflict was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Adjustment applied to the weighted score, if any (annotate-only by default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_adjustment: Option<f32>,
}

impl ConflictResult {
    pub fn none() -> Self {
        Self {
            detected: false,
            kind: ConflictKind::None,
            variance: 0.0,
            delta: 0.0,
            resolution: None,
            score_adjustment: None,
        }
    }
}
