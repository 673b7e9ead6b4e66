use serde::{Deserialize, Serialize};

use crate::model::answer::Answer;
use crate::model::ids::QuestionId;
use crate::model::question::Marks;

/// How a single question was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    Partial,
    Unattempted,
}

impl Outcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Wrong => "wrong",
            Outcome::Partial => "partial",
            Outcome::Unattempted => "unattempted",
        }
    }
}

/// Per-question line of the score breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// 1-based position in the paper.
    pub number: usize,
    pub question_id: QuestionId,
    pub outcome: Outcome,
    pub marks: Marks,
    pub time_spent_secs: u32,
    /// The literal stored answer, kept for audit.
    pub answer: Option<Answer>,
}

/// Score breakdown produced once at submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: Marks,
    pub attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub partial: u32,
    pub unattempted: u32,
    pub questions: Vec<QuestionResult>,
}

impl ExamResult {
    /// Seconds spent across all questions.
    #[must_use]
    pub fn total_time_secs(&self) -> u64 {
        self.questions
            .iter()
            .map(|q| u64::from(q.time_spent_secs))
            .sum()
    }
}
