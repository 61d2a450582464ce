//! # Model Wrappers
//!
//! One wrapper per underlying classifier. Each wraps a text-classification
//! backend with a known label vocabulary, enforces input truncation and a
//! per-model inference timeout, and normalizes the raw output into a
//! [`ModelSignal`](crate::models::ModelSignal) crisis signal.
//!
//! The default backends are deterministic weighted-lexicon scorers; the
//! async trait boundary lets a heavyweight inference runtime slot in behind
//! the same contract.

pub mod crisis;
pub mod emotion;
pub mod irony;
pub mod lexicon;
pub mod normalize;
pub mod sentiment;
pub mod truncation;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use tracing::warn;

use crate::config::ModelConfig;
use crate::error::ClassifierError;

/// Raw classifier output: the top label and its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

/// Contract implemented by every classification backend.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Stable model identifier used in configuration and responses.
    fn model_id(&self) -> &'static str;

    /// Label vocabulary this model can emit.
    fn labels(&self) -> &'static [&'static str];

    /// Classify the (already truncated) text. Must not panic; failures are
    /// reported as [`ClassifierError::ModelUnavailable`].
    async fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;
}

/// Output of one wrapper invocation, before ensemble weighting.
#[derive(Debug, Clone)]
pub struct WrapperOutput {
    pub model_id: String,
    pub label: String,
    /// Probability of the top label, in [0, 1].
    pub score: f32,
    /// Normalized crisis signal in [0, 1].
    pub crisis_signal: f32,
    pub was_truncated: bool,
}

/// Wraps a classifier with truncation, timeout and normalization.
pub struct ModelWrapper {
    classifier: Box<dyn TextClassifier>,
}

impl ModelWrapper {
    pub fn new(classifier: Box<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    pub fn model_id(&self) -> &'static str {
        self.classifier.model_id()
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.classifier.labels()
    }

    /// Analyze one message. Truncates per the model's budget, enforces the
    /// inference timeout, and normalizes the result. Never panics; failures
    /// come back as [`ClassifierError::ModelUnavailable`] for this model only.
    pub async fn analyze(
        &self,
        text: &str,
        cfg: &ModelConfig,
    ) -> Result<WrapperOutput, ClassifierError> {
        let model_id = self.model_id();
        let (input, was_truncated) = truncation::truncate(text, cfg.token_budget, cfg.truncation);
        if was_truncated {
            warn!(model = model_id, budget = cfg.token_budget, "input truncated");
        }

        let started = Instant::now();
        let prediction = tokio::time::timeout(
            Duration::from_millis(cfg.timeout_ms),
            self.classifier.classify(&input),
        )
        .await
        .map_err(|_| ClassifierError::ModelUnavailable {
            model_id: model_id.to_string(),
            reason: format!("inference timed out after {}ms", cfg.timeout_ms),
        })??;
        histogram!("vigil_model_inference_ms", "model" => model_id)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let score = prediction.score.clamp(0.0, 1.0);
        Ok(WrapperOutput {
            model_id: model_id.to_string(),
            crisis_signal: normalize::crisis_signal(model_id, &prediction.label, score),
            label: prediction.label,
            score,
            was_truncated,
        })
    }
}

/// The default model fleet, in ensemble order.
pub fn default_wrappers() -> Vec<std::sync::Arc<ModelWrapper>> {
    vec![
        std::sync::Arc::new(ModelWrapper::new(Box::new(crisis::CrisisClassifier::new()))),
        std::sync::Arc::new(ModelWrapper::new(Box::new(
            sentiment::SentimentClassifier::new(),
        ))),
        std::sync::Arc::new(ModelWrapper::new(Box::new(
            emotion::EmotionClassifier::new(),
        ))),
        std::sync::Arc::new(ModelWrapper::new(Box::new(irony::IronyClassifier::new()))),
    ]
}
