use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::TimeLedger;
use crate::model::answer::Answer;
use crate::model::ids::{AttemptId, CandidateId};
use crate::model::result::ExamResult;

/// Session lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Submitted,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::InProgress => "in_progress",
            SessionPhase::Submitted => "submitted",
        }
    }
}

/// What ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    Timeout,
}

impl SubmitReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitReason::Manual => "manual",
            SubmitReason::Timeout => "timeout",
        }
    }
}

/// The frozen outcome of a submitted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub reason: SubmitReason,
    pub submitted_at: DateTime<Utc>,
    pub result: ExamResult,
}

/// Durable snapshot of a session, keyed by candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub candidate_id: CandidateId,
    pub attempt_id: AttemptId,
    pub phase: SessionPhase,
    pub remaining_secs: u32,
    pub time_ledger: TimeLedger,
    pub current_index: usize,
    pub responses: BTreeMap<usize, Answer>,
    pub review: BTreeSet<usize>,
    pub submission: Option<Submission>,
    pub saved_at: DateTime<Utc>,
}

impl SessionCheckpoint {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }

    /// In-progress checkpoints resume only on the UTC day they were written;
    /// a submitted checkpoint is always honored.
    #[must_use]
    pub fn is_resumable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_submitted() || self.saved_at.date_naive() == now.date_naive()
    }
}
