//! Irony/sarcasm classifier. Labels: `irony`, `non_irony`.
//!
//! The ensemble treats this model as a dampener: a strongly ironic message
//! makes the other models' signals less reliable, it never contributes a
//! positive crisis term of its own.

use async_trait::async_trait;

use super::lexicon::Lexicon;
use super::{Prediction, TextClassifier};
use crate::error::ClassifierError;

pub const MODEL_ID: &str = "irony";

const LABELS: &[&str] = &["irony", "non_irony"];

pub struct IronyClassifier {
    cues: Lexicon,
}

impl Default for IronyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IronyClassifier {
    pub fn new() -> Self {
        let cues = Lexicon::new(&[
            ("oh great", 0.5),
            ("oh wonderful", 0.5),
            ("oh fantastic", 0.5),
            ("just great", 0.4),
            ("just perfect", 0.4),
            ("just what i needed", 0.5),
            ("just what i wanted", 0.5),
            ("just my luck", 0.4),
            ("how lovely", 0.4),
            ("lucky me", 0.4),
            ("yeah right", 0.5),
            ("sure thing", 0.2),
            ("as always", 0.2),
            ("another wonderful", 0.3),
            ("another great", 0.3),
            ("another perfect", 0.3),
            ("couldn't be happier", 0.3),
            ("/s", 0.6),
            ("\u{1f644}", 0.4),
            ("\u{1f643}", 0.3),
            ("\u{1f62c}", 0.2),
        ]);
        Self { cues }
    }
}

#[async_trait]
impl TextClassifier for IronyClassifier {
    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn labels(&self) -> &'static [&'static str] {
        LABELS
    }

    async fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let raw = self.cues.score(text).clamp(0.0, 1.0);
        let (label, score) = if raw >= 0.5 {
            ("irony", raw)
        } else {
            ("non_irony", 1.0 - raw)
        };
        Ok(Prediction {
            label: label.to_string(),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stacked_cues_read_as_irony() {
        let model = IronyClassifier::new();
        let pred = model
            .classify("Oh great, another wonderful day, just what I needed \u{1f644}")
            .await
            .unwrap();
        assert_eq!(pred.label, "irony");
        assert!(pred.score >= 0.9);
    }

    #[tokio::test]
    async fn sincere_text_is_non_irony() {
        let model = IronyClassifier::new();
        let pred = model
            .classify("Had a really good day today, thanks for asking!")
            .await
            .unwrap();
        assert_eq!(pred.label, "non_irony");
        assert!(pred.score >= 0.9);
    }
}
