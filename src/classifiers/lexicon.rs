//! Weighted-lexicon text scoring shared by the classifier backends.
//!
//! Terms compile to word-boundary regexes once at construction; scoring a
//! message is a linear scan with no allocation beyond the lowercased input.

use regex::Regex;

/// Words that flip or weaken the meaning of a following term.
const NEGATORS: &[&str] = &[
    "not", "never", "no", "don't", "dont", "doesn't", "doesnt", "isn't", "isnt", "wasn't", "wasnt",
    "won't", "wont", "ain't", "aint", "hardly", "barely",
];

/// How far back (in characters) a negator may sit before a matched term.
const NEGATION_WINDOW: usize = 18;

/// Damping factor applied to a term found inside a negation window.
const NEGATION_FACTOR: f32 = 0.25;

struct Entry {
    pattern: Regex,
    weight: f32,
}

/// A compiled set of weighted terms.
pub struct Lexicon {
    entries: Vec<Entry>,
}

impl Lexicon {
    /// Compile a lexicon from `(term, weight)` pairs. Multi-word terms match
    /// across arbitrary whitespace; terms are matched case-insensitively on
    /// word boundaries where the term edges are word characters.
    pub fn new(terms: &[(&str, f32)]) -> Self {
        let entries = terms
            .iter()
            .map(|(term, weight)| Entry {
                pattern: compile_term(term),
                weight: *weight,
            })
            .collect();
        Self { entries }
    }

    /// Sum of weights of matched terms, each term counted once. Never negative.
    pub fn score(&self, text: &str) -> f32 {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.pattern.is_match(&lowered))
            .map(|entry| entry.weight)
            .sum()
    }

    /// Like [`score`](Self::score) but terms preceded by a negator within a
    /// short window contribute only a fraction of their weight.
    pub fn score_negated(&self, text: &str) -> f32 {
        let lowered = text.to_lowercase();
        let mut total = 0.0;
        for entry in &self.entries {
            if let Some(m) = entry.pattern.find(&lowered) {
                let window_start = m.start().saturating_sub(NEGATION_WINDOW);
                let preceding = &lowered[floor_char_boundary(&lowered, window_start)..m.start()];
                let negated = preceding
                    .split_whitespace()
                    .any(|word| NEGATORS.contains(&word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')));
                total += if negated {
                    entry.weight * NEGATION_FACTOR
                } else {
                    entry.weight
                };
            }
        }
        total
    }
}

fn compile_term(term: &str) -> Regex {
    let escaped = regex::escape(&term.to_lowercase()).replace(r"\ ", r"\s+");
    let starts_word = term.chars().next().is_some_and(|c| c.is_alphanumeric());
    let ends_word = term.chars().last().is_some_and(|c| c.is_alphanumeric());
    let pattern = format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" },
    );
    // Terms are static literals; compilation cannot fail after escaping.
    Regex::new(&pattern).unwrap_or_else(|_| Regex::new(&regex::escape(term)).unwrap())
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
