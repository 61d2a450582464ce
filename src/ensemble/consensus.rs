//! Consensus layer: fuses per-model signals into a consensus score and label
//! via a named voting algorithm.

use std::collections::BTreeMap;

use crate::config::{ConsensusConfig, SeverityThresholds};
use crate::models::{ConsensusAlgorithm, ConsensusResult};

/// One model's contribution as seen by the voting algorithms: the crisis
/// signal with the irony dampener already applied, plus the ensemble weight.
#[derive(Debug, Clone)]
pub struct Vote {
    pub model_id: String,
    pub signal: f32,
    pub weight: f32,
}

/// Population variance of a signal series.
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
}

/// Run the selected voting algorithm over the votes.
///
/// With fewer than two votes every algorithm degenerates to passing the
/// single signal through with full agreement.
pub fn run(
    algorithm: ConsensusAlgorithm,
    votes: &[Vote],
    cfg: &ConsensusConfig,
    thresholds: &SeverityThresholds,
) -> ConsensusResult {
    let total_weight: f32 = votes.iter().map(|v| v.weight).sum();
    let vote_weights: BTreeMap<String, f32> = votes
        .iter()
        .map(|v| {
            let normalized = if total_weight > 0.0 {
                v.weight / total_weight
            } else {
                0.0
            };
            (v.model_id.clone(), normalized)
        })
        .collect();

    if votes.len() < 2 {
        let score = votes.first().map(|v| v.signal).unwrap_or(0.0);
        return ConsensusResult {
            algorithm,
            consensus_score: score.clamp(0.0, 1.0),
            consensus_label: thresholds.severity_for(score),
            agreement: 1.0,
            vote_weights,
        };
    }

    let signals: Vec<f32> = votes.iter().map(|v| v.signal).collect();
    let weighted = votes.iter().map(|v| v.weight * v.signal).sum::<f32>() / total_weight;

    let (consensus_score, agreement) = match algorithm {
        ConsensusAlgorithm::WeightedVoting => {
            // Max variance for values in [0, 1] is 0.25.
            let normalized_variance = (variance(&signals) / 0.25).clamp(0.0, 1.0);
            (weighted, 1.0 - normalized_variance)
        }
        ConsensusAlgorithm::Majority => {
            // Strictly above the threshold counts as a crisis vote; a tie at
            // the exact threshold does not.
            let crisis_weight: f32 = votes
                .iter()
                .filter(|v| v.signal > cfg.per_model_positive_threshold)
                .map(|v| v.weight)
                .sum();
            let ratio = crisis_weight / total_weight;
            (ratio, ((ratio - 0.5).abs() * 2.0).clamp(0.0, 1.0))
        }
        ConsensusAlgorithm::Unanimous => {
            let all_crisis = votes
                .iter()
                .all(|v| v.signal > cfg.per_model_positive_threshold);
            if all_crisis {
                (weighted, 1.0)
            } else {
                // Without unanimity the consensus cannot reach the low bucket.
                let ceiling = (thresholds.low - 1e-3).max(0.0);
                let crisis_weight: f32 = votes
                    .iter()
                    .filter(|v| v.signal > cfg.per_model_positive_threshold)
                    .map(|v| v.weight)
                    .sum();
                let dissent_ratio = crisis_weight / total_weight;
                let agreement = dissent_ratio.max(1.0 - dissent_ratio);
                (weighted.min(ceiling), agreement)
            }
        }
    };

    ConsensusResult {
        algorithm,
        consensus_score: consensus_score.clamp(0.0, 1.0),
        consensus_label: thresholds.severity_for(consensus_score),
        agreement: agreement.clamp(0.0, 1.0),
        vote_weights,
    }
}
