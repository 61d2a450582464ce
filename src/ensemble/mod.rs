//! # Ensemble Engine
//!
//! Executes the enabled model wrappers concurrently, fuses their signals
//! into a weighted crisis score, and assembles a full
//! [`CrisisAssessment`] with consensus and conflict metadata.

pub mod conflict;
pub mod consensus;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::classifiers::{self, ModelWrapper, irony};
use crate::config::DetectionConfig;
use crate::error::EngineError;
use crate::models::{
    ConsensusAlgorithm, CrisisAssessment, InterventionUrgency, ModelSignal, RecommendedAction,
    Severity,
};

use conflict::ConflictInput;
use consensus::Vote;

/// Process-wide ensemble. Wrappers are initialized once and read-only;
/// weights, thresholds and timeouts come from the per-request config snapshot.
pub struct EnsembleEngine {
    wrappers: Vec<Arc<ModelWrapper>>,
}

/// Assessment plus the non-fatal warnings gathered while producing it.
#[derive(Debug)]
pub struct EnsembleOutcome {
    pub assessment: CrisisAssessment,
    pub warnings: Vec<String>,
}

impl Default for EnsembleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EnsembleEngine {
    /// Engine over the default model fleet.
    pub fn new() -> Self {
        Self::with_wrappers(classifiers::default_wrappers())
    }

    /// Engine over an explicit wrapper set (tests inject failing backends here).
    pub fn with_wrappers(wrappers: Vec<Arc<ModelWrapper>>) -> Self {
        Self { wrappers }
    }

    pub fn wrappers(&self) -> &[Arc<ModelWrapper>] {
        &self.wrappers
    }

    /// Run all enabled wrappers concurrently and collect their signals.
    /// Individual failures become warnings; they never fail the request.
    async fn collect_signals(
        &self,
        text: &str,
        cfg: &DetectionConfig,
    ) -> Result<(BTreeMap<String, ModelSignal>, Vec<String>), EngineError> {
        let enabled: Vec<(Arc<ModelWrapper>, crate::config::ModelConfig)> = self
            .wrappers
            .iter()
            .filter_map(|w| {
                cfg.models
                    .get(w.model_id())
                    .filter(|m| m.enabled)
                    .map(|m| (w.clone(), m.clone()))
            })
            .collect();
        if enabled.is_empty() {
            return Err(EngineError::NoModelsEnabled);
        }

        let mut join_set = JoinSet::new();
        for (wrapper, model_cfg) in enabled {
            let input = text.to_owned();
            join_set.spawn(async move {
                let result = wrapper.analyze(&input, &model_cfg).await;
                (wrapper.model_id(), model_cfg.weight, result)
            });
        }

        let mut signals = BTreeMap::new();
        let mut warnings = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((model_id, weight, Ok(output))) => {
                    signals.insert(
                        output.model_id.clone(),
                        ModelSignal {
                            model_id: output.model_id,
                            label: output.label,
                            score: output.score,
                            crisis_signal: output.crisis_signal,
                            weight,
                            was_truncated: output.was_truncated,
                        },
                    );
                    debug!(model = model_id, "signal collected");
                }
                Ok((model_id, _, Err(err))) => {
                    warn!(model = model_id, error = %err, "model unavailable");
                    warnings.push(err.to_string());
                }
                Err(join_err) => {
                    warn!(error = %join_err, "model task panicked");
                    warnings.push(format!("model task failed: {join_err}"));
                }
            }
        }

        if signals.is_empty() {
            return Err(EngineError::AllModelsUnavailable { failures: warnings });
        }
        Ok((signals, warnings))
    }

    /// Weighted score over the contributing models with the irony dampener
    /// applied. Returns the dampener alongside for observability.
    fn fuse(signals: &BTreeMap<String, ModelSignal>) -> Option<(f32, f32)> {
        let dampener = signals
            .get(irony::MODEL_ID)
            .map(|s| (1.0 - s.crisis_signal).clamp(0.0, 1.0))
            .unwrap_or(1.0);

        let contributing: Vec<&ModelSignal> = signals
            .values()
            .filter(|s| s.model_id != irony::MODEL_ID)
            .collect();
        let weight_sum: f32 = contributing.iter().map(|s| s.weight).sum();
        if contributing.is_empty() || weight_sum <= 0.0 {
            return None;
        }

        let weighted: f32 = contributing
            .iter()
            .map(|s| s.weight * s.crisis_signal)
            .sum::<f32>()
            / weight_sum;
        Some((dampener * weighted, dampener))
    }

    /// Score a text without the full assessment; used to re-score history
    /// items that arrived without a prior crisis score.
    pub async fn score_text(&self, text: &str, cfg: &DetectionConfig) -> Result<f32, EngineError> {
        let (signals, warnings) = self.collect_signals(text, cfg).await?;
        Self::fuse(&signals)
            .map(|(score, _)| score.clamp(0.0, 1.0))
            .ok_or(EngineError::AllModelsUnavailable { failures: warnings })
    }

    /// Produce the full assessment for one message. Context analysis and the
    /// explanation are layered on by the request handler afterwards.
    pub async fn assess(
        &self,
        text: &str,
        cfg: &DetectionConfig,
        algorithm: ConsensusAlgorithm,
    ) -> Result<EnsembleOutcome, EngineError> {
        let (signals, warnings) = self.collect_signals(text, cfg).await?;

        let Some((weighted, dampener)) = Self::fuse(&signals) else {
            // Only the irony dampener responded; there is nothing to score.
            let mut failures = warnings;
            failures.push("no contributing model produced a signal".to_string());
            return Err(EngineError::AllModelsUnavailable { failures });
        };

        let contributing: Vec<&ModelSignal> = signals
            .values()
            .filter(|s| s.model_id != irony::MODEL_ID)
            .collect();

        let votes: Vec<Vote> = contributing
            .iter()
            .map(|s| Vote {
                model_id: s.model_id.clone(),
                signal: (s.crisis_signal * dampener).clamp(0.0, 1.0),
                weight: s.weight,
            })
            .collect();
        let consensus =
            consensus::run(algorithm, &votes, &cfg.consensus, &cfg.thresholds);

        let primary_model = contributing
            .iter()
            .max_by(|a, b| {
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|s| s.model_id.clone());
        let conflict_inputs: Vec<ConflictInput<'_>> = contributing
            .iter()
            .map(|s| ConflictInput {
                signal: s,
                damped: (s.crisis_signal * dampener).clamp(0.0, 1.0),
            })
            .collect();
        let conflict = conflict::analyze(
            &conflict_inputs,
            weighted,
            primary_model.as_deref(),
            cfg.consensus.per_model_positive_threshold,
            &cfg.conflict,
        );

        let crisis_score = conflict
            .score_adjustment
            .unwrap_or(weighted)
            .clamp(0.0, 1.0);
        let severity = cfg.thresholds.severity_for(crisis_score);
        let confidence =
            (consensus.agreement * (1.0 - conflict.variance.clamp(0.0, 1.0))).clamp(0.0, 1.0);

        let urgency = InterventionUrgency::base_for(severity);
        let assessment = CrisisAssessment {
            crisis_detected: severity >= Severity::Low,
            severity,
            crisis_score,
            confidence,
            requires_intervention: urgency >= InterventionUrgency::Standard,
            intervention_urgency: urgency,
            recommended_action: RecommendedAction::for_urgency(urgency),
            signals,
            consensus,
            conflict_analysis: conflict,
            context_analysis: None,
            explanation: None,
        };

        Ok(EnsembleOutcome {
            assessment,
            warnings,
        })
    }
}
