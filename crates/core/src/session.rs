use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::countdown::Countdown;
use crate::evaluator::evaluate;
use crate::ledger::{LedgerError, TimeAccountant, TimeLedger};
use crate::model::{
    Answer, AnswerStatus, AttemptId, Candidate, ExamPaper, ExamResult, Question, QuestionKind,
    SessionCheckpoint, SessionPhase, SubmitReason, Submission,
};
use crate::responses::{ResponseError, ResponseStore};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not started")]
    NotStarted,

    #[error("session already started")]
    AlreadyStarted,

    #[error("session already submitted")]
    Submitted,

    #[error("question index {index} is out of range ({count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("option {option} is out of range for question {index} ({options} options)")]
    OptionOutOfRange {
        index: usize,
        option: usize,
        options: usize,
    },

    #[error("question {index} is {actual}, not {expected}")]
    KindMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("checkpoint does not fit this paper: {0}")]
    CheckpointMismatch(String),
}

impl From<ResponseError> for SessionError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::QuestionOutOfRange { index, count } => {
                SessionError::QuestionOutOfRange { index, count }
            }
        }
    }
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::OutOfRange { index, count } => {
                SessionError::QuestionOutOfRange { index, count }
            }
            other @ LedgerError::LengthMismatch { .. } => {
                SessionError::CheckpointMismatch(other.to_string())
            }
        }
    }
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Every event that can change a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Focus(usize),
    Next,
    Previous,
    ToggleSingle { question: usize, option: usize },
    ToggleMulti { question: usize, option: usize },
    SetNumeric { question: usize, raw: String },
    Clear(usize),
    ToggleReview(usize),
    Tick,
    Submit,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One candidate's attempt at a paper: the only owner of session state.
///
/// All mutation goes through [`ExamSession::start`] and [`ExamSession::apply`].
/// Timestamps are passed in by the caller so the session never reads a clock.
pub struct ExamSession {
    paper: Arc<ExamPaper>,
    candidate: Candidate,
    attempt_id: AttemptId,
    phase: SessionPhase,
    countdown: Countdown,
    responses: ResponseStore,
    time: TimeAccountant,
    submission: Option<Submission>,
}

impl ExamSession {
    /// A fresh, not-started session with the paper's full time budget.
    #[must_use]
    pub fn new(paper: Arc<ExamPaper>, candidate: Candidate) -> Self {
        let count = paper.len();
        Self {
            countdown: Countdown::new(paper.duration_secs()),
            responses: ResponseStore::new(count),
            time: TimeAccountant::new(count),
            paper,
            candidate,
            attempt_id: AttemptId::generate(),
            phase: SessionPhase::NotStarted,
            submission: None,
        }
    }

    /// Rebuild a session from a checkpoint.
    ///
    /// The remaining budget comes from the checkpoint, never from the paper's
    /// duration. A submitted checkpoint yields a submitted session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CheckpointMismatch` if the checkpoint belongs to
    /// another candidate or does not fit the paper.
    pub fn resume(
        paper: Arc<ExamPaper>,
        candidate: Candidate,
        checkpoint: SessionCheckpoint,
    ) -> Result<Self, SessionError> {
        if &checkpoint.candidate_id != candidate.id() {
            return Err(SessionError::CheckpointMismatch(format!(
                "checkpoint belongs to candidate {}",
                checkpoint.candidate_id
            )));
        }
        if checkpoint.remaining_secs > paper.duration_secs() {
            return Err(SessionError::CheckpointMismatch(format!(
                "remaining {}s exceeds the {}s budget",
                checkpoint.remaining_secs,
                paper.duration_secs()
            )));
        }

        let count = paper.len();
        let time = TimeAccountant::restore(checkpoint.time_ledger, checkpoint.current_index, count)?;
        let responses = ResponseStore::restore(count, checkpoint.responses, checkpoint.review)
            .map_err(|err| SessionError::CheckpointMismatch(err.to_string()))?;
        for (index, answer) in responses.answers() {
            answer_fits(&paper, *index, answer)
                .map_err(|err| SessionError::CheckpointMismatch(err.to_string()))?;
        }

        let (phase, submission) = match (checkpoint.phase, checkpoint.submission) {
            (SessionPhase::Submitted, Some(submission)) => {
                (SessionPhase::Submitted, Some(submission))
            }
            (SessionPhase::Submitted, None) => {
                return Err(SessionError::CheckpointMismatch(
                    "submitted checkpoint has no result".into(),
                ));
            }
            (_, _) => (SessionPhase::NotStarted, None),
        };

        Ok(Self {
            paper,
            candidate,
            attempt_id: checkpoint.attempt_id,
            phase,
            countdown: Countdown::new(checkpoint.remaining_secs),
            responses,
            time,
            submission,
        })
    }

    /// Move from not-started to in-progress and start the countdown at `now`.
    ///
    /// Returns the submission if the restored budget was already exhausted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` or `SessionError::Submitted`
    /// when the session is past not-started.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Option<Submission>, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => {}
            SessionPhase::InProgress => return Err(SessionError::AlreadyStarted),
            SessionPhase::Submitted => return Err(SessionError::Submitted),
        }

        self.phase = SessionPhase::InProgress;
        self.countdown.arm(now);
        if self.countdown.is_expired() {
            return Ok(Some(self.finalize(SubmitReason::Timeout, now)));
        }
        Ok(None)
    }

    /// Apply one command at `now`.
    ///
    /// Every command charges elapsed time first, so a command arriving after
    /// the budget ran out submits with reason timeout and is not applied.
    ///
    /// Returns `Some(submission)` exactly once: on the command that ends the
    /// session, whether by manual submit or by the budget running out. Ticks
    /// and submits after that are no-ops returning `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`, `SessionError::Submitted`
    /// for answer or navigation commands after submission, and validation
    /// errors for bad indexes or commands that do not fit the question kind.
    pub fn apply(
        &mut self,
        command: SessionCommand,
        now: DateTime<Utc>,
    ) -> Result<Option<Submission>, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Submitted => {
                return match command {
                    SessionCommand::Tick | SessionCommand::Submit => Ok(None),
                    _ => Err(SessionError::Submitted),
                };
            }
            SessionPhase::InProgress => {}
        }

        // Every command first charges elapsed time; an expired budget wins.
        if let Some(timed_out) = self.advance(now) {
            return Ok(Some(timed_out));
        }

        match command {
            SessionCommand::Tick => Ok(None),
            SessionCommand::Submit => Ok(Some(self.finalize(SubmitReason::Manual, now))),
            SessionCommand::Focus(index) => self.move_focus(index),
            SessionCommand::Next => {
                let last = self.paper.len() - 1;
                self.move_focus((self.current_index() + 1).min(last))
            }
            SessionCommand::Previous => {
                self.move_focus(self.current_index().saturating_sub(1))
            }
            SessionCommand::ToggleSingle { question, option } => {
                self.check_choice(question, option, "single_choice")?;
                self.responses.toggle_single(question, option)?;
                Ok(None)
            }
            SessionCommand::ToggleMulti { question, option } => {
                self.check_choice(question, option, "multi_choice")?;
                self.responses.toggle_multi(question, option)?;
                Ok(None)
            }
            SessionCommand::SetNumeric { question, raw } => {
                self.check_kind(question, "numeric")?;
                self.responses.set_numeric(question, raw)?;
                Ok(None)
            }
            SessionCommand::Clear(index) => {
                self.responses.clear(index)?;
                Ok(None)
            }
            SessionCommand::ToggleReview(index) => {
                self.responses.toggle_review(index)?;
                Ok(None)
            }
        }
    }

    /// Snapshot everything needed to rebuild this session.
    #[must_use]
    pub fn checkpoint(&self, now: DateTime<Utc>) -> SessionCheckpoint {
        SessionCheckpoint {
            candidate_id: self.candidate.id().clone(),
            attempt_id: self.attempt_id,
            phase: self.phase,
            remaining_secs: self.countdown.remaining(),
            time_ledger: self.time.ledger().clone(),
            current_index: self.time.focused(),
            responses: self.responses.answers().clone(),
            review: self.responses.review_flags().clone(),
            submission: self.submission.clone(),
            saved_at: now,
        }
    }

    #[must_use]
    pub fn paper(&self) -> &ExamPaper {
        &self.paper
    }

    #[must_use]
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.time.focused()
    }

    #[must_use]
    pub fn responses(&self) -> &ResponseStore {
        &self.responses
    }

    #[must_use]
    pub fn ledger(&self) -> &TimeLedger {
        self.time.ledger()
    }

    #[must_use]
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.submission.as_ref().map(|s| &s.result)
    }

    /// Palette status of every question, in paper order.
    #[must_use]
    pub fn statuses(&self) -> Vec<AnswerStatus> {
        (0..self.paper.len())
            .map(|i| {
                self.responses
                    .status(i)
                    .unwrap_or(AnswerStatus::Unanswered)
            })
            .collect()
    }

    fn move_focus(&mut self, index: usize) -> Result<Option<Submission>, SessionError> {
        self.check_index(index)?;
        self.time.focus(index)?;
        Ok(None)
    }

    /// Charge elapsed time to the focused question; submits on expiry.
    fn advance(&mut self, now: DateTime<Utc>) -> Option<Submission> {
        let tick = self.countdown.tick(now);
        self.time.record(tick.charged);
        tick.expired
            .then(|| self.finalize(SubmitReason::Timeout, now))
    }

    fn finalize(&mut self, reason: SubmitReason, now: DateTime<Utc>) -> Submission {
        self.countdown.stop();
        let submission = Submission {
            reason,
            submitted_at: now,
            result: evaluate(&self.paper, &self.responses, self.time.ledger()),
        };
        self.phase = SessionPhase::Submitted;
        self.submission = Some(submission.clone());
        submission
    }

    fn check_index(&self, index: usize) -> Result<&Question, SessionError> {
        self.paper
            .question(index)
            .ok_or(SessionError::QuestionOutOfRange {
                index,
                count: self.paper.len(),
            })
    }

    fn check_kind(&self, index: usize, expected: &'static str) -> Result<&Question, SessionError> {
        let question = self.check_index(index)?;
        let actual = question.kind().label();
        if actual != expected {
            return Err(SessionError::KindMismatch {
                index,
                expected,
                actual,
            });
        }
        Ok(question)
    }

    fn check_choice(
        &self,
        index: usize,
        option: usize,
        expected: &'static str,
    ) -> Result<(), SessionError> {
        let options = self.check_kind(index, expected)?.option_count();
        if option >= options {
            return Err(SessionError::OptionOutOfRange {
                index,
                option,
                options,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("candidate", self.candidate.id())
            .field("attempt_id", &self.attempt_id)
            .field("phase", &self.phase)
            .field("remaining_secs", &self.countdown.remaining())
            .field("current", &self.time.focused())
            .field("answered", &self.responses.attempted_count())
            .finish_non_exhaustive()
    }
}

/// Checks a restored answer against its question's kind and option range.
fn answer_fits(paper: &ExamPaper, index: usize, answer: &Answer) -> Result<(), SessionError> {
    let question = paper.question(index).ok_or(SessionError::QuestionOutOfRange {
        index,
        count: paper.len(),
    })?;
    let options = question.option_count();
    let fits = match (question.kind(), answer) {
        (QuestionKind::SingleChoice { .. }, Answer::Single(option)) => *option < options,
        (QuestionKind::MultiChoice { .. }, Answer::Multi(set)) => set.iter().all(|o| *o < options),
        (QuestionKind::Numeric { .. }, Answer::Numeric(_)) => true,
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(SessionError::CheckpointMismatch(format!(
            "answer for question {index} does not fit a {} question",
            question.kind().label()
        )))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
