use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A candidate's stored answer, tagged by the shape its question expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Single(usize),
    Multi(BTreeSet<usize>),
    /// Raw text exactly as typed; parsed only by comparison at evaluation.
    Numeric(String),
}

impl Answer {
    /// An empty selection or empty text counts the same as no answer.
    #[must_use]
    pub fn is_attempted(&self) -> bool {
        match self {
            Answer::Single(_) => true,
            Answer::Multi(set) => !set.is_empty(),
            Answer::Numeric(raw) => !raw.is_empty(),
        }
    }

    /// Human-readable form: option letters for choices, raw text for numeric.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Answer::Single(index) => option_label(*index),
            Answer::Multi(set) => set
                .iter()
                .map(|index| option_label(*index))
                .collect::<Vec<_>>()
                .join(", "),
            Answer::Numeric(raw) => raw.clone(),
        }
    }
}

/// Letter label for an option position: A, B, ... Z, then 27, 28, ...
#[must_use]
pub fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Palette status of a question. Display only; never consulted for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    Unanswered,
    MarkedForReview,
}

impl AnswerStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerStatus::Answered => "answered",
            AnswerStatus::Unanswered => "unanswered",
            AnswerStatus::MarkedForReview => "marked_for_review",
        }
    }
}
