//! Core enumerations shared across the detection pipeline.
//!
//! Ordered enums (`Severity`, `InterventionUrgency`) derive `Ord` from their
//! variant order, which the boost rules and threshold checks rely on.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Crisis severity bucket derived from the ensemble score via ordered thresholds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Safe => "safe",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Bump one level up, saturating at `Critical`.
    pub fn escalate(self) -> Self {
        match self {
            Severity::Safe => Severity::Low,
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-facing action level, derived from severity and boosted by
/// escalation and temporal factors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InterventionUrgency {
    None,
    Low,
    Standard,
    High,
    Immediate,
}

impl InterventionUrgency {
    /// Base mapping from severity before any boost rules apply.
    pub fn base_for(severity: Severity) -> Self {
        match severity {
            Severity::Safe => InterventionUrgency::None,
            Severity::Low => InterventionUrgency::Low,
            Severity::Medium => InterventionUrgency::Standard,
            Severity::High => InterventionUrgency::High,
            Severity::Critical => InterventionUrgency::Immediate,
        }
    }

    /// Bump one level up, saturating at `Immediate`.
    pub fn boost(self) -> Self {
        match self {
            InterventionUrgency::None => InterventionUrgency::Low,
            InterventionUrgency::Low => InterventionUrgency::Standard,
            InterventionUrgency::Standard => InterventionUrgency::High,
            InterventionUrgency::High | InterventionUrgency::Immediate => {
                InterventionUrgency::Immediate
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            InterventionUrgency::None => "none",
            InterventionUrgency::Low => "low",
            InterventionUrgency::Standard => "standard",
            InterventionUrgency::High => "high",
            InterventionUrgency::Immediate => "immediate",
        }
    }
}

impl fmt::Display for InterventionUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended operator action. Deterministic function of the intervention
/// urgency, which itself folds in severity plus the boost rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    None,
    Observe,
    Watch,
    PriorityResponse,
    ImmediateOutreach,
}

impl RecommendedAction {
    pub fn for_urgency(urgency: InterventionUrgency) -> Self {
        match urgency {
            InterventionUrgency::None => RecommendedAction::None,
            InterventionUrgency::Low => RecommendedAction::Observe,
            InterventionUrgency::Standard => RecommendedAction::Watch,
            InterventionUrgency::High => RecommendedAction::PriorityResponse,
            InterventionUrgency::Immediate => RecommendedAction::ImmediateOutreach,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RecommendedAction::None => "none",
            RecommendedAction::Observe => "observe",
            RecommendedAction::Watch => "watch",
            RecommendedAction::PriorityResponse => "priority_response",
            RecommendedAction::ImmediateOutreach => "immediate_outreach",
        }
    }
}

/// Trajectory classification over a message history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EscalationRate {
    None,
    Gradual,
    Rapid,
    Sudden,
}

impl fmt::Display for EscalationRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EscalationRate::None => "none",
            EscalationRate::Gradual => "gradual",
            EscalationRate::Rapid => "rapid",
            EscalationRate::Sudden => "sudden",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
    Volatile,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TrendVelocity {
    None,
    Gradual,
    Moderate,
    Rapid,
}

/// Kind of disagreement found among per-model signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    None,
    ScoreVariance,
    LabelMismatch,
    SignFlip,
}

/// Voting algorithm used by the consensus layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusAlgorithm {
    WeightedVoting,
    Majority,
    Unanimous,
}

impl ConsensusAlgorithm {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConsensusAlgorithm::WeightedVoting => "weighted_voting",
            ConsensusAlgorithm::Majority => "majority",
            ConsensusAlgorithm::Unanimous => "unanimous",
        }
    }
}

/// Verbosity of the optional natural-language explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Minimal,
    Standard,
    Detailed,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Standard
    }
}

/// Strategy applied when input text exceeds a model's token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Prefer the last complete sentences that fit the budget.
    Smart,
    /// Keep the front of the text.
    Head,
    /// Keep the back of the text.
    Tail,
}

impl Default for TruncationStrategy {
    fn default() -> Self {
        TruncationStrategy::Smart
    }
}
