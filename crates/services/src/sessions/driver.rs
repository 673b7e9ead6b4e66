//! Single-task owner of a running session.
//!
//! The driver serializes interval ticks and caller commands on one task, so
//! the session never needs a lock. Callers talk to it through a cloneable
//! [`SessionHandle`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use exam_core::model::{SessionPhase, Submission};
use exam_core::{Clock, ExamSession, SessionCommand, SessionError};
use storage::repository::CheckpointRepository;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::progress::SessionProgress;
use crate::config::{DEFAULT_DELIVERY_TIMEOUT, DEFAULT_TICK};
use crate::error::SessionServiceError;
use crate::sink::{ResultNotification, ResultSink};

const COMMAND_BUFFER: usize = 32;

enum DriverMessage {
    Apply {
        command: SessionCommand,
        reply: oneshot::Sender<Result<SessionProgress, SessionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionProgress>,
    },
    Shutdown {
        reply: oneshot::Sender<SessionProgress>,
    },
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

/// Cloneable front door to a running driver.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<DriverMessage>,
    phase: watch::Receiver<SessionPhase>,
}

impl SessionHandle {
    /// Apply a command and return the progress right after it.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Domain` if the session rejects the
    /// command, or `SessionServiceError::DriverStopped` if the driver is gone.
    pub async fn apply(
        &self,
        command: SessionCommand,
    ) -> Result<SessionProgress, SessionServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(DriverMessage::Apply { command, reply })
            .await
            .map_err(|_| SessionServiceError::DriverStopped)?;
        let outcome = response
            .await
            .map_err(|_| SessionServiceError::DriverStopped)?;
        Ok(outcome?)
    }

    /// Submit manually. A second submit is absorbed by the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::DriverStopped` if the driver is gone.
    pub async fn submit(&self) -> Result<SessionProgress, SessionServiceError> {
        self.apply(SessionCommand::Submit).await
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::DriverStopped` if the driver is gone.
    pub async fn snapshot(&self) -> Result<SessionProgress, SessionServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(DriverMessage::Snapshot { reply })
            .await
            .map_err(|_| SessionServiceError::DriverStopped)?;
        response
            .await
            .map_err(|_| SessionServiceError::DriverStopped)
    }

    /// Stop the driver after a final tick and checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::DriverStopped` if the driver is already gone.
    pub async fn shutdown(&self) -> Result<SessionProgress, SessionServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(DriverMessage::Shutdown { reply })
            .await
            .map_err(|_| SessionServiceError::DriverStopped)?;
        response
            .await
            .map_err(|_| SessionServiceError::DriverStopped)
    }

    /// Last published phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Resolves once the session is submitted. Returns `false` if the driver
    /// stopped first.
    pub async fn wait_submitted(&self) -> bool {
        let mut phase = self.phase.clone();
        phase
            .wait_for(|phase| *phase == SessionPhase::Submitted)
            .await
            .is_ok()
    }
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

pub struct SessionDriver {
    session: ExamSession,
    clock: Clock,
    checkpoints: Arc<dyn CheckpointRepository>,
    sink: Arc<dyn ResultSink>,
    tick_interval: Duration,
    delivery_timeout: Duration,
    phase: watch::Sender<SessionPhase>,
    deliveries: JoinSet<()>,
}

impl SessionDriver {
    #[must_use]
    pub fn new(
        session: ExamSession,
        clock: Clock,
        checkpoints: Arc<dyn CheckpointRepository>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let (phase, _) = watch::channel(session.phase());
        Self {
            session,
            clock,
            checkpoints,
            sink,
            tick_interval: DEFAULT_TICK,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            phase,
            deliveries: JoinSet::new(),
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

    /// Start the session on a new task.
    ///
    /// The task ends on `shutdown` or once every handle is dropped, and yields
    /// the final progress.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<SessionProgress>) {
        let (commands, messages) = mpsc::channel(COMMAND_BUFFER);
        let handle = SessionHandle {
            commands,
            phase: self.phase.subscribe(),
        };
        let task = tokio::spawn(self.run(messages));
        (handle, task)
    }

    async fn run(mut self, mut messages: mpsc::Receiver<DriverMessage>) -> SessionProgress {
        self.begin().await;

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let pending_reply = loop {
            let running = self.session.phase() == SessionPhase::InProgress;
            tokio::select! {
                _ = ticker.tick(), if running => {
                    if let Err(err) = self.dispatch(SessionCommand::Tick).await {
                        debug!(%err, "tick rejected");
                    }
                }
                message = messages.recv() => match message {
                    Some(DriverMessage::Apply { command, reply }) => {
                        let outcome = self.dispatch(command).await.map(|()| self.progress());
                        let _ = reply.send(outcome);
                    }
                    Some(DriverMessage::Snapshot { reply }) => {
                        let _ = reply.send(self.progress());
                    }
                    Some(DriverMessage::Shutdown { reply }) => break Some(reply),
                    None => break None,
                },
            }
        };

        let progress = self.finish().await;
        if let Some(reply) = pending_reply {
            let _ = reply.send(progress.clone());
        }
        progress
    }

    async fn begin(&mut self) {
        if self.session.phase() != SessionPhase::NotStarted {
            return;
        }

        let now = self.clock.now();
        match self.session.start(now) {
            Ok(Some(submission)) => self.on_submitted(submission, now).await,
            Ok(None) => {
                self.phase.send_replace(self.session.phase());
                info!(
                    candidate = %self.session.candidate().id(),
                    attempt = %self.session.attempt_id(),
                    remaining_secs = self.session.remaining_secs(),
                    "session started"
                );
                self.save_checkpoint(now).await;
            }
            Err(err) => warn!(%err, "session could not start"),
        }
    }

    async fn dispatch(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        let now = self.clock.now();
        let was_running = self.session.phase() == SessionPhase::InProgress;
        debug!(?command, "applying command");

        match self.session.apply(command, now)? {
            Some(submission) => self.on_submitted(submission, now).await,
            None if was_running => self.save_checkpoint(now).await,
            None => {}
        }
        Ok(())
    }

    async fn on_submitted(&mut self, submission: Submission, now: DateTime<Utc>) {
        self.phase.send_replace(SessionPhase::Submitted);
        info!(
            candidate = %self.session.candidate().id(),
            attempt = %self.session.attempt_id(),
            score = submission.result.score,
            reason = ?submission.reason,
            "session submitted"
        );
        self.save_checkpoint(now).await;

        let sink = Arc::clone(&self.sink);
        let notification = ResultNotification::new(
            self.session.candidate(),
            self.session.attempt_id(),
            &submission,
        );
        self.deliveries.spawn(async move {
            match sink.deliver(&notification).await {
                Ok(()) => debug!(candidate = %notification.id, "result delivered"),
                Err(err) => warn!(%err, candidate = %notification.id, "result delivery failed"),
            }
        });
    }

    async fn save_checkpoint(&self, now: DateTime<Utc>) {
        let checkpoint = self.session.checkpoint(now);
        if let Err(err) = self.checkpoints.save_checkpoint(&checkpoint).await {
            warn!(
                %err,
                candidate = %checkpoint.candidate_id,
                "checkpoint write failed; continuing in memory"
            );
        }
    }

    async fn finish(&mut self) -> SessionProgress {
        if self.session.phase() == SessionPhase::InProgress {
            if let Err(err) = self.dispatch(SessionCommand::Tick).await {
                warn!(%err, "final tick rejected");
            }
        }

        if !self.deliveries.is_empty() {
            let deliveries = &mut self.deliveries;
            let drained = tokio::time::timeout(self.delivery_timeout, async {
                while deliveries.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                warn!(
                    pending = self.deliveries.len(),
                    "result delivery timed out; abandoning"
                );
                self.deliveries.abort_all();
            }
        }

        debug!(phase = self.session.phase().as_str(), "session driver stopped");
        self.progress()
    }

    fn progress(&self) -> SessionProgress {
        SessionProgress::of(&self.session)
    }
}
