use exam_core::ExamSession;
use exam_core::model::{Answer, AnswerStatus, SessionPhase, Submission};
use exam_core::time::format_clock;

/// Read-only view of a running session, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: SessionPhase,
    pub remaining_secs: u32,
    pub current_index: usize,
    pub current_answer: Option<Answer>,
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub statuses: Vec<AnswerStatus>,
    pub submission: Option<Submission>,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &ExamSession) -> Self {
        let current_index = session.current_index();
        let responses = session.responses();
        Self {
            phase: session.phase(),
            remaining_secs: session.remaining_secs(),
            current_index,
            current_answer: responses.answer(current_index).cloned(),
            total: session.paper().len(),
            answered: responses.attempted_count(),
            marked: responses.review_flags().len(),
            statuses: session.statuses(),
            submission: session.submission().cloned(),
        }
    }

    /// Remaining time as `MM:SS`.
    #[must_use]
    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }
}
