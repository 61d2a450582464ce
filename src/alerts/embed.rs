//! Chat-platform embed types and limit enforcement.
//!
//! The platform rejects oversized payloads outright, so every field is
//! truncated intelligently (sentence or word boundary, visible ellipsis)
//! before a send is attempted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::ModelSignal;

pub const CONTENT_LIMIT: usize = 2000;
pub const DESCRIPTION_LIMIT: usize = 4096;
pub const FIELD_VALUE_LIMIT: usize = 1024;
pub const TOTAL_EMBED_LIMIT: usize = 6000;

/// Marker appended wherever content was cut.
const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    /// Accent color as 0xRRGGBB.
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

impl Embed {
    /// Characters counted against the platform's total embed budget.
    pub fn total_len(&self) -> usize {
        self.title.chars().count()
            + self.description.chars().count()
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }

    /// Truncate every part to its individual limit, then drop trailing
    /// fields until the embed as a whole fits.
    pub fn enforce_limits(&mut self) {
        self.description = truncate_text(&self.description, DESCRIPTION_LIMIT);
        for field in &mut self.fields {
            field.value = truncate_text(&field.value, FIELD_VALUE_LIMIT);
        }
        while self.total_len() > TOTAL_EMBED_LIMIT && !self.fields.is_empty() {
            self.fields.pop();
        }
        if self.total_len() > TOTAL_EMBED_LIMIT {
            let headroom = TOTAL_EMBED_LIMIT.saturating_sub(self.title.chars().count());
            self.description = truncate_text(&self.description, headroom);
        }
    }
}

/// Truncate to `limit` characters, preferring a sentence boundary, falling
/// back to a word boundary, and marking the cut with an ellipsis.
pub fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let kept: String = text.chars().take(limit - 1).collect();

    // Prefer cutting after the last complete sentence if it keeps most of
    // the budget in use.
    if let Some(pos) = kept.rfind(['.', '!', '?']) {
        if pos + 1 >= (limit * 3) / 5 {
            let mut result: String = kept[..=pos].trim_end().to_string();
            result.push(ELLIPSIS);
            return result;
        }
    }

    // Otherwise cut at the last word boundary.
    let cut = kept.rfind(char::is_whitespace).unwrap_or(kept.len());
    let mut result: String = kept[..cut].trim_end().to_string();
    result.push(ELLIPSIS);
    result
}

/// Fixed-width bar chart of per-model crisis signals for variance alerts.
pub fn signal_bar_chart(signals: &BTreeMap<String, ModelSignal>) -> String {
    const WIDTH: usize = 10;
    let mut lines = Vec::with_capacity(signals.len());
    for (model_id, signal) in signals {
        let filled = ((signal.crisis_signal * WIDTH as f32).round() as usize).min(WIDTH);
        lines.push(format!(
            "{:<10} [{}{}] {:.2}",
            model_id,
            "#".repeat(filled),
            "-".repeat(WIDTH - filled),
            signal.crisis_signal
        ));
    }
    lines.join("\n")
}
