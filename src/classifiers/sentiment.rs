//! Sentiment classifier. Labels: `negative`, `neutral`, `positive`.

use async_trait::async_trait;

use super::lexicon::Lexicon;
use super::{Prediction, TextClassifier};
use crate::error::ClassifierError;

pub const MODEL_ID: &str = "sentiment";

const LABELS: &[&str] = &["negative", "neutral", "positive"];

/// Margin by which one polarity must beat the other to leave neutral.
const POLARITY_MARGIN: f32 = 0.1;

pub struct SentimentClassifier {
    negative: Lexicon,
    positive: Lexicon,
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier {
    pub fn new() -> Self {
        let negative = Lexicon::new(&[
            ("can't do this", 0.8),
            ("cant do this", 0.8),
            ("anymore", 0.3),
            ("hopeless", 0.8),
            ("worthless", 0.8),
            ("depressed", 0.8),
            ("miserable", 0.7),
            ("awful", 0.7),
            ("terrible", 0.7),
            ("horrible", 0.7),
            ("worst", 0.6),
            ("hate", 0.6),
            ("hurt", 0.5),
            ("hurts", 0.5),
            ("pain", 0.5),
            ("crying", 0.5),
            ("cry", 0.4),
            ("scared", 0.5),
            ("afraid", 0.5),
            ("anxious", 0.5),
            ("angry", 0.5),
            ("alone", 0.4),
            ("lonely", 0.4),
            ("sad", 0.5),
            ("empty", 0.4),
            ("tired", 0.3),
            ("exhausted", 0.4),
            ("can't", 0.3),
            ("cant", 0.3),
            ("never", 0.2),
            ("lost", 0.3),
            ("sick of", 0.5),
            ("fed up", 0.5),
            ("done with", 0.4),
        ]);
        let positive = Lexicon::new(&[
            ("good", 0.5),
            ("great", 0.5),
            ("amazing", 0.7),
            ("wonderful", 0.6),
            ("fantastic", 0.6),
            ("awesome", 0.6),
            ("happy", 0.6),
            ("glad", 0.5),
            ("love", 0.5),
            ("better", 0.4),
            ("improving", 0.4),
            ("hopeful", 0.5),
            ("grateful", 0.5),
            ("thanks", 0.4),
            ("thank you", 0.4),
            ("excited", 0.5),
            ("proud", 0.5),
            ("fun", 0.4),
            ("relaxed", 0.4),
            ("calm", 0.3),
            ("fine", 0.3),
            ("okay", 0.2),
        ]);
        Self { negative, positive }
    }
}

#[async_trait]
impl TextClassifier for SentimentClassifier {
    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn labels(&self) -> &'static [&'static str] {
        LABELS
    }

    async fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let neg = self.negative.score_negated(text).clamp(0.0, 1.0);
        let pos = self.positive.score_negated(text).clamp(0.0, 1.0);

        let (label, score) = if neg > pos + POLARITY_MARGIN {
            ("negative", neg)
        } else if pos > neg + POLARITY_MARGIN {
            ("positive", pos)
        } else {
            // Neutral confidence shrinks as both polarities grow.
            ("neutral", (1.0 - (pos + neg) / 2.0).clamp(0.1, 1.0))
        };

        Ok(Prediction {
            label: label.to_string(),
            score,
        })
    }
}
