//! Emotion classifier. Labels: `sadness`, `grief`, `fear`, `anger`, `joy`,
//! `neutral`. The crisis-positive set is {grief, sadness, fear, anger}.

use async_trait::async_trait;

use super::lexicon::Lexicon;
use super::{Prediction, TextClassifier};
use crate::error::ClassifierError;

pub const MODEL_ID: &str = "emotion";

const LABELS: &[&str] = &["sadness", "grief", "fear", "anger", "joy", "neutral"];

pub struct EmotionClassifier {
    sadness: Lexicon,
    grief: Lexicon,
    fear: Lexicon,
    anger: Lexicon,
    joy: Lexicon,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionClassifier {
    pub fn new() -> Self {
        let sadness = Lexicon::new(&[
            ("sad", 0.5),
            ("crying", 0.5),
            ("cry", 0.4),
            ("tears", 0.4),
            ("miserable", 0.6),
            ("depressed", 0.7),
            ("down", 0.2),
            ("alone", 0.4),
            ("lonely", 0.5),
            ("empty", 0.4),
            ("hopeless", 0.6),
            ("hurts", 0.3),
            ("can't do this anymore", 0.6),
            ("cant do this anymore", 0.6),
            ("give up", 0.4),
        ]);
        let grief = Lexicon::new(&[
            ("grief", 0.8),
            ("grieving", 0.8),
            ("mourning", 0.7),
            ("passed away", 0.7),
            ("lost my", 0.4),
            ("miss her so much", 0.6),
            ("miss him so much", 0.6),
            ("miss them so much", 0.6),
            ("funeral", 0.6),
        ]);
        let fear = Lexicon::new(&[
            ("scared", 0.6),
            ("terrified", 0.8),
            ("afraid", 0.6),
            ("panic", 0.6),
            ("panicking", 0.7),
            ("anxious", 0.5),
            ("anxiety", 0.5),
            ("dread", 0.6),
            ("frightened", 0.6),
        ]);
        let anger = Lexicon::new(&[
            ("furious", 0.7),
            ("angry", 0.6),
            ("rage", 0.7),
            ("hate", 0.5),
            ("pissed", 0.6),
            ("fed up", 0.5),
            ("sick of", 0.5),
        ]);
        let joy = Lexicon::new(&[
            ("happy", 0.6),
            ("great", 0.4),
            ("good day", 0.5),
            ("amazing", 0.6),
            ("wonderful", 0.5),
            ("excited", 0.6),
            ("grateful", 0.5),
            ("thanks", 0.3),
            ("love", 0.4),
            ("fun", 0.4),
        ]);
        Self {
            sadness,
            grief,
            fear,
            anger,
            joy,
        }
    }
}

#[async_trait]
impl TextClassifier for EmotionClassifier {
    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn labels(&self) -> &'static [&'static str] {
        LABELS
    }

    async fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let scored = [
            ("sadness", self.sadness.score_negated(text)),
            ("grief", self.grief.score_negated(text)),
            ("fear", self.fear.score_negated(text)),
            ("anger", self.anger.score_negated(text)),
            ("joy", self.joy.score_negated(text)),
        ];

        let best = scored
            .iter()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .copied();

        let (label, score) = match best {
            Some((label, score)) if score >= 0.2 => (label, score.clamp(0.0, 1.0)),
            _ => ("neutral", 0.6),
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
    async fn sadness_wins_on_sad_text() {
        let model = EmotionClassifier::new();
        let pred = model
            .classify("I have been crying all night, so lonely")
            .await
            .unwrap();
        assert_eq!(pred.label, "sadness");
        assert!(pred.score >= 0.5);
    }

    #[tokio::test]
    async fn joy_wins_on_upbeat_text() {
        let model = EmotionClassifier::new();
        let pred = model
            .classify("What a good day, I am so happy and grateful")
            .await
            .unwrap();
        assert_eq!(pred.label, "joy");
    }

    #[tokio::test]
    async fn plain_text_is_neutral() {
        let model = EmotionClassifier::new();
        let pred = model.classify("The report is due on Friday").await.unwrap();
        assert_eq!(pred.label, "neutral");
    }
}
