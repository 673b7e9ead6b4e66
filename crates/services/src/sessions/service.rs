use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use exam_core::model::{Candidate, CandidateId, ExamPaper, SessionCheckpoint, Submission};
use exam_core::ExamSession;
use storage::repository::CheckpointRepository;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::driver::{SessionDriver, SessionHandle};
use super::progress::SessionProgress;
use crate::Clock;
use crate::config::{DEFAULT_DELIVERY_TIMEOUT, DEFAULT_TICK};
use crate::error::SessionServiceError;
use crate::sink::ResultSink;

/// Opens sessions: resumes a usable checkpoint or starts fresh, then hands
/// the session to a driver task.
#[derive(Clone)]
pub struct ExamSessionService {
    clock: Clock,
    checkpoints: Arc<dyn CheckpointRepository>,
    sink: Arc<dyn ResultSink>,
    tick_interval: Duration,
    delivery_timeout: Duration,
}

impl ExamSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        checkpoints: Arc<dyn CheckpointRepository>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            clock,
            checkpoints,
            sink,
            tick_interval: DEFAULT_TICK,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }

    /// Build the candidate's session without starting it.
    ///
    /// A submitted checkpoint is always honored. An in-progress checkpoint is
    /// resumed only on the UTC day it was saved. Unreadable, stale, or
    /// mismatched checkpoints are discarded in favour of a fresh session.
    pub async fn open_session(&self, paper: Arc<ExamPaper>, candidate: Candidate) -> ExamSession {
        let now = self.clock.now();

        let Some(checkpoint) = self.load_usable(candidate.id(), now).await else {
            info!(candidate = %candidate.id(), "starting fresh session");
            return ExamSession::new(paper, candidate);
        };

        let phase = checkpoint.phase;
        match ExamSession::resume(Arc::clone(&paper), candidate.clone(), checkpoint) {
            Ok(session) => {
                info!(
                    candidate = %candidate.id(),
                    attempt = %session.attempt_id(),
                    phase = phase.as_str(),
                    remaining_secs = session.remaining_secs(),
                    "resuming session"
                );
                session
            }
            Err(err) => {
                warn!(%err, candidate = %candidate.id(), "checkpoint does not fit paper; starting fresh");
                self.discard(candidate.id()).await;
                ExamSession::new(paper, candidate)
            }
        }
    }

    /// Open the candidate's session and start its driver.
    pub async fn start(
        &self,
        paper: Arc<ExamPaper>,
        candidate: Candidate,
    ) -> (SessionHandle, JoinHandle<SessionProgress>) {
        let session = self.open_session(paper, candidate).await;
        SessionDriver::new(
            session,
            self.clock,
            Arc::clone(&self.checkpoints),
            Arc::clone(&self.sink),
        )
        .with_tick_interval(self.tick_interval)
        .with_delivery_timeout(self.delivery_timeout)
        .spawn()
    }

    /// The stored submission for a candidate, if their session was submitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the checkpoint cannot be read.
    pub async fn stored_submission(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<Submission>, SessionServiceError> {
        let checkpoint = self.checkpoints.load_checkpoint(candidate).await?;
        Ok(checkpoint.and_then(|c| c.submission))
    }

    async fn load_usable(
        &self,
        candidate: &CandidateId,
        now: DateTime<Utc>,
    ) -> Option<SessionCheckpoint> {
        let checkpoint = match self.checkpoints.load_checkpoint(candidate).await {
            Ok(checkpoint) => checkpoint?,
            Err(err) => {
                warn!(%err, candidate = %candidate, "checkpoint read failed; starting fresh");
                return None;
            }
        };

        if checkpoint.is_resumable_at(now) {
            return Some(checkpoint);
        }
        info!(
            candidate = %candidate,
            saved_at = %checkpoint.saved_at,
            "checkpoint is from an earlier day; discarding"
        );
        self.discard(candidate).await;
        None
    }

    async fn discard(&self, candidate: &CandidateId) {
        if let Err(err) = self.checkpoints.delete_checkpoint(candidate).await {
            warn!(%err, candidate = %candidate, "could not discard checkpoint");
        }
    }
}
