//! Input truncation applied before inference when text exceeds a model's
//! token budget. Tokens are whitespace-separated words, which tracks the
//! subword budgets of the wrapped models closely enough for a hard cap.

use std::borrow::Cow;

use crate::models::TruncationStrategy;

/// Truncate `text` to at most `budget` tokens using the given strategy.
/// Returns the (possibly borrowed) text and whether truncation occurred.
pub fn truncate(text: &str, budget: usize, strategy: TruncationStrategy) -> (Cow<'_, str>, bool) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= budget || budget == 0 {
        return (Cow::Borrowed(text), false);
    }

    let kept = match strategy {
        TruncationStrategy::Head => tokens[..budget].join(" "),
        TruncationStrategy::Tail => tokens[tokens.len() - budget..].join(" "),
        TruncationStrategy::Smart => smart_truncate(text, budget)
            .unwrap_or_else(|| tokens[tokens.len() - budget..].join(" ")),
    };
    (Cow::Owned(kept), true)
}

/// Keep the trailing complete sentences that fit within the budget.
/// Returns `None` when not even one trailing sentence fits.
fn smart_truncate(text: &str, budget: usize) -> Option<String> {
    let sentences = split_sentences(text);
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0usize;

    for sentence in sentences.iter().rev() {
        let len = sentence.split_whitespace().count();
        if used + len > budget {
            break;
        }
        used += len;
        kept.push(sentence);
    }

    if kept.is_empty() {
        return None;
    }
    kept.reverse();
    Some(kept.join(" "))
}

/// Split text into sentences at `.`, `!`, `?` runs, keeping the terminator.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut in_terminator = false;

    for (idx, ch) in text.char_indices() {
        let is_term = matches!(ch, '.' | '!' | '?');
        if in_terminator && !is_term {
            let slice = text[start..idx].trim();
            if !slice.is_empty() {
                sentences.push(slice);
            }
            start = idx;
        }
        in_terminator = is_term;
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_within_budget_is_untouched() {
        let (out, truncated) = truncate("short message here", 10, TruncationStrategy::Smart);
        assert_eq!(out, "short message here");
        assert!(!truncated);
    }

    #[test]
    fn head_keeps_the_front() {
        let (out, truncated) = truncate("one two three four five", 3, TruncationStrategy::Head);
        assert_eq!(out, "one two three");
        assert!(truncated);
    }

    #[test]
    fn tail_keeps_the_back() {
        let (out, truncated) = truncate("one two three four five", 3, TruncationStrategy::Tail);
        assert_eq!(out, "three four five");
        assert!(truncated);
    }

    #[test]
    fn smart_prefers_trailing_complete_sentences() {
        let text = "This is old context. It rambles on for a while. I feel terrible tonight.";
        let (out, truncated) = truncate(text, 8, TruncationStrategy::Smart);
        assert!(truncated);
        assert_eq!(out, "I feel terrible tonight.");
    }

    #[test]
    fn smart_falls_back_to_tail_for_one_long_sentence() {
        let text = "a b c d e f g h i j k l m n o p";
        let (out, truncated) = truncate(text, 4, TruncationStrategy::Smart);
        assert!(truncated);
        assert_eq!(out, "m n o p");
    }

    #[test]
    fn sentence_split_keeps_terminators() {
        let sentences = split_sentences("Really?! Yes. Fine");
        assert_eq!(sentences, vec!["Really?!", "Yes.", "Fine"]);
    }
}
