//! Crisis classifier: detects direct expressions of self-harm intent and
//! acute distress. Labels: `crisis`, `distress`, `safe`.

use async_trait::async_trait;

use super::lexicon::Lexicon;
use super::{Prediction, TextClassifier};
use crate::error::ClassifierError;

pub const MODEL_ID: &str = "crisis";

const LABELS: &[&str] = &["crisis", "distress", "safe"];

pub struct CrisisClassifier {
    severe: Lexicon,
    moderate: Lexicon,
    mild: Lexicon,
}

impl Default for CrisisClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CrisisClassifier {
    pub fn new() -> Self {
        let severe = Lexicon::new(&[
            ("kill myself", 1.0),
            ("killing myself", 1.0),
            ("end my life", 1.0),
            ("ending my life", 1.0),
            ("take my own life", 1.0),
            ("suicide", 1.0),
            ("suicidal", 1.0),
            ("want to die", 1.0),
            ("wanna die", 1.0),
            ("wish i was dead", 1.0),
            ("wish i were dead", 1.0),
            ("better off dead", 1.0),
            ("better off without me", 0.9),
            ("end it all", 1.0),
            ("can't go on", 0.9),
            ("cant go on", 0.9),
            ("can't do this anymore", 1.0),
            ("cant do this anymore", 1.0),
            ("can't keep going", 0.9),
            ("cant keep going", 0.9),
            ("no reason to live", 1.0),
            ("nothing to live for", 1.0),
            ("hurt myself", 0.9),
            ("hurting myself", 0.9),
            ("harm myself", 0.9),
            ("self harm", 0.9),
            ("self-harm", 0.9),
            ("goodbye forever", 0.8),
        ]);
        let moderate = Lexicon::new(&[
            ("hopeless", 0.5),
            ("worthless", 0.5),
            ("no way out", 0.5),
            ("no point anymore", 0.5),
            ("give up", 0.4),
            ("giving up", 0.4),
            ("had enough", 0.4),
            ("can't take it", 0.5),
            ("cant take it", 0.5),
            ("unbearable", 0.5),
            ("trapped", 0.4),
            ("hate myself", 0.5),
            ("burden to everyone", 0.5),
            ("everyone would be better", 0.5),
            ("empty inside", 0.4),
            ("falling apart", 0.4),
        ]);
        let mild = Lexicon::new(&[
            ("overwhelmed", 0.2),
            ("exhausted", 0.2),
            ("so tired", 0.2),
            ("alone", 0.25),
            ("lonely", 0.25),
            ("numb", 0.25),
            ("broken", 0.25),
            ("desperate", 0.25),
            ("drowning", 0.25),
            ("lost", 0.2),
            ("struggling", 0.2),
        ]);
        Self {
            severe,
            moderate,
            mild,
        }
    }

    fn raw_score(&self, text: &str) -> f32 {
        let severe = self.severe.score_negated(text);
        let moderate = self.moderate.score_negated(text);
        let mild = self.mild.score_negated(text);
        (severe + moderate + mild).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl TextClassifier for CrisisClassifier {
    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn labels(&self) -> &'static [&'static str] {
        LABELS
    }

    async fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let raw = self.raw_score(text);
        let (label, score) = if raw >= 0.5 {
            ("crisis", raw)
        } else if raw >= 0.2 {
            ("distress", raw)
        } else {
            ("safe", 1.0 - raw)
        };
        Ok(Prediction {
            label: label.to_string(),
            score,
        })
    }
}
