use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Marks awarded or deducted for one outcome.
pub type Marks = i32;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id}: prompt cannot be empty")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id}: choice questions need at least one option")]
    NoOptions { id: QuestionId },

    #[error("question {id}: correct option {index} is out of range ({options} options)")]
    CorrectOutOfRange {
        id: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("question {id}: multi-choice questions need at least one correct option")]
    EmptyCorrectSet { id: QuestionId },

    #[error("question {id}: numeric answer cannot be empty")]
    EmptyNumericAnswer { id: QuestionId },
}

//
// ─── MARKING ───────────────────────────────────────────────────────────────────
//

/// Per-question marking scheme.
///
/// `on_partial` is only consulted for multi-choice questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marking {
    #[serde(alias = "correct")]
    pub on_correct: Marks,
    #[serde(alias = "wrong")]
    pub on_wrong: Marks,
    #[serde(default, alias = "unattempted")]
    pub on_unattempted: Marks,
    #[serde(default, alias = "partial")]
    pub on_partial: Marks,
}

impl Marking {
    #[must_use]
    pub fn new(on_correct: Marks, on_wrong: Marks, on_unattempted: Marks, on_partial: Marks) -> Self {
        Self {
            on_correct,
            on_wrong,
            on_unattempted,
            on_partial,
        }
    }
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// Answer type of a question together with its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    #[serde(alias = "mcq")]
    SingleChoice { options: Vec<String>, correct: usize },
    #[serde(alias = "msq")]
    MultiChoice {
        options: Vec<String>,
        correct: BTreeSet<usize>,
    },
    #[serde(alias = "integer")]
    Numeric { answer: String },
}

impl QuestionKind {
    /// Short label used in errors and reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice { .. } => "single_choice",
            QuestionKind::MultiChoice { .. } => "multi_choice",
            QuestionKind::Numeric { .. } => "numeric",
        }
    }

    /// Options in display order; empty for numeric questions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::SingleChoice { options, .. } | QuestionKind::MultiChoice { options, .. } => {
                options
            }
            QuestionKind::Numeric { .. } => &[],
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in a paper file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub marking: Marking,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// Numeric answer keys are stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, a choice question has no
    /// options or an out-of-range key, or a numeric key is blank.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id;
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }

        let kind = match self.kind {
            QuestionKind::SingleChoice { options, correct } => {
                check_options(id, &options, [correct].iter())?;
                QuestionKind::SingleChoice { options, correct }
            }
            QuestionKind::MultiChoice { options, correct } => {
                if correct.is_empty() {
                    return Err(QuestionError::EmptyCorrectSet { id });
                }
                check_options(id, &options, correct.iter())?;
                QuestionKind::MultiChoice { options, correct }
            }
            QuestionKind::Numeric { answer } => {
                let answer = answer.trim();
                if answer.is_empty() {
                    return Err(QuestionError::EmptyNumericAnswer { id });
                }
                QuestionKind::Numeric {
                    answer: answer.to_string(),
                }
            }
        };

        Ok(Question {
            id,
            prompt: self.prompt,
            image: self.image.filter(|path| !path.trim().is_empty()),
            kind,
            marking: self.marking,
        })
    }
}

fn check_options<'a>(
    id: QuestionId,
    options: &[String],
    correct: impl Iterator<Item = &'a usize>,
) -> Result<(), QuestionError> {
    if options.is_empty() {
        return Err(QuestionError::NoOptions { id });
    }
    for &index in correct {
        if index >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                id,
                index,
                options: options.len(),
            });
        }
    }
    Ok(())
}

/// A validated, immutable question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    image: Option<String>,
    kind: QuestionKind,
    marking: Marking,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn marking(&self) -> Marking {
        self.marking
    }

    /// Number of selectable options (0 for numeric questions).
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.kind.options().len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
