use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, QuestionDraft, QuestionError};

/// Default session budget: thirty minutes.
pub const DEFAULT_DURATION_SECS: u32 = 30 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PaperError {
    #[error("paper title cannot be empty")]
    EmptyTitle,

    #[error("paper has no questions")]
    NoQuestions,

    #[error("paper duration must be > 0 seconds")]
    InvalidDuration,

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Paper file contents before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperDraft {
    pub title: String,
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
    pub questions: Vec<QuestionDraft>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

impl PaperDraft {
    /// Validate every question and the paper-level constraints.
    ///
    /// # Errors
    ///
    /// Returns `PaperError` for a blank title, zero duration, no questions,
    /// duplicate question ids, or the first invalid question.
    pub fn validate(self) -> Result<ExamPaper, PaperError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(PaperError::EmptyTitle);
        }
        if self.duration_secs == 0 {
            return Err(PaperError::InvalidDuration);
        }
        if self.questions.is_empty() {
            return Err(PaperError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        let mut questions = Vec::with_capacity(self.questions.len());
        for draft in self.questions {
            if !seen.insert(draft.id) {
                return Err(PaperError::DuplicateQuestion(draft.id));
            }
            questions.push(draft.validate()?);
        }

        Ok(ExamPaper {
            title,
            duration_secs: self.duration_secs,
            questions,
        })
    }
}

/// An immutable, validated question paper with its time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamPaper {
    title: String,
    duration_secs: u32,
    questions: Vec<Question>,
}

impl ExamPaper {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions; never zero for a validated paper.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
