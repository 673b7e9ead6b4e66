use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use exam_core::ledger::TimeLedger;
use exam_core::model::{
    Answer, AttemptId, Candidate, CandidateId, ExamPaper, Marking, PaperDraft, QuestionDraft,
    QuestionId, QuestionKind, SessionCheckpoint, SessionPhase, SubmitReason,
};
use exam_core::time::fixed_now;
use exam_core::{SessionCommand, SessionError};
use services::{
    Clock, ExamSessionService, MemoryResultSink, ResultNotification, ResultSink,
    SessionServiceError, SinkError,
};
use storage::repository::{CheckpointRepository, InMemoryRepository, StorageError};

fn paper(duration_secs: u32) -> Arc<ExamPaper> {
    let marking = Marking::new(4, -1, 0, 1);
    Arc::new(
        PaperDraft {
            title: "Mock".into(),
            duration_secs,
            questions: vec![
                QuestionDraft {
                    id: QuestionId::new(1),
                    prompt: "Pick B".into(),
                    image: None,
                    kind: QuestionKind::SingleChoice {
                        options: vec!["A".into(), "B".into(), "C".into()],
                        correct: 1,
                    },
                    marking,
                },
                QuestionDraft {
                    id: QuestionId::new(2),
                    prompt: "Pick A and C".into(),
                    image: None,
                    kind: QuestionKind::MultiChoice {
                        options: vec!["A".into(), "B".into(), "C".into()],
                        correct: [0, 2].into_iter().collect(),
                    },
                    marking,
                },
                QuestionDraft {
                    id: QuestionId::new(3),
                    prompt: "6 x 7".into(),
                    image: None,
                    kind: QuestionKind::Numeric {
                        answer: "42".into(),
                    },
                    marking,
                },
            ],
        }
        .validate()
        .unwrap(),
    )
}

fn candidate() -> Candidate {
    Candidate::new("JEE-1", "Asha").unwrap()
}

fn in_progress(remaining_secs: u32, ledger: Vec<u32>) -> SessionCheckpoint {
    SessionCheckpoint {
        candidate_id: candidate().id().clone(),
        attempt_id: AttemptId::generate(),
        phase: SessionPhase::InProgress,
        remaining_secs,
        time_ledger: TimeLedger::from(ledger),
        current_index: 1,
        responses: BTreeMap::new(),
        review: BTreeSet::new(),
        submission: None,
        saved_at: fixed_now(),
    }
}

fn service(repo: &InMemoryRepository, sink: &MemoryResultSink, clock: Clock) -> ExamSessionService {
    ExamSessionService::new(clock, Arc::new(repo.clone()), Arc::new(sink.clone()))
        .with_tick_interval(Duration::from_millis(20))
        .with_delivery_timeout(Duration::from_secs(2))
}

struct FailingRepository;

#[async_trait]
impl CheckpointRepository for FailingRepository {
    async fn load_checkpoint(
        &self,
        _candidate: &CandidateId,
    ) -> Result<Option<SessionCheckpoint>, StorageError> {
        Err(StorageError::Connection("disk on fire".into()))
    }

    async fn save_checkpoint(&self, _checkpoint: &SessionCheckpoint) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk on fire".into()))
    }

    async fn delete_checkpoint(&self, _candidate: &CandidateId) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk on fire".into()))
    }
}

struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn deliver(&self, _notification: &ResultNotification) -> Result<(), SinkError> {
        Err(SinkError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY))
    }
}

#[tokio::test]
async fn answers_and_submit_notify_once() {
    let repo = InMemoryRepository::new();
    let sink = MemoryResultSink::new();
    let svc = service(&repo, &sink, Clock::fixed(fixed_now()));

    let (handle, task) = svc.start(paper(600), candidate()).await;
    assert_eq!(handle.snapshot().await.unwrap().phase, SessionPhase::InProgress);
    assert_eq!(handle.phase(), SessionPhase::InProgress);

    handle
        .apply(SessionCommand::ToggleSingle {
            question: 0,
            option: 1,
        })
        .await
        .unwrap();
    handle.apply(SessionCommand::Next).await.unwrap();
    handle
        .apply(SessionCommand::ToggleMulti {
            question: 1,
            option: 0,
        })
        .await
        .unwrap();
    let progress = handle.apply(SessionCommand::ToggleReview(1)).await.unwrap();
    assert_eq!(progress.current_index, 1);
    assert_eq!(progress.answered, 2);
    assert_eq!(progress.marked, 1);
    assert_eq!(progress.clock(), "10:00");

    let first = handle.submit().await.unwrap();
    let second = handle.submit().await.unwrap();
    assert!(first.is_submitted());
    assert_eq!(first.submission, second.submission);

    let result = &first.submission.as_ref().unwrap().result;
    assert_eq!(result.score, 4 + 1);
    assert_eq!(result.partial, 1);

    let err = handle
        .apply(SessionCommand::SetNumeric {
            question: 2,
            raw: "42".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Domain(exam_core::Error::Session(SessionError::Submitted))
    ));

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].reason, SubmitReason::Manual);
    assert_eq!(delivered[0].id, "JEE-1");

    let stored = repo
        .load_checkpoint(candidate().id())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_submitted());
}

#[tokio::test]
async fn resume_keeps_persisted_budget_and_ledger() {
    let repo = InMemoryRepository::new();
    let sink = MemoryResultSink::new();
    let saved = in_progress(900, vec![30, 45, 0]);
    repo.save_checkpoint(&saved).await.unwrap();

    let svc = service(&repo, &sink, Clock::fixed(fixed_now()));
    let (handle, task) = svc.start(paper(1800), candidate()).await;

    let progress = handle.snapshot().await.unwrap();
    assert_eq!(progress.remaining_secs, 900);
    assert_eq!(progress.current_index, 1);

    drop(handle);
    let last = task.await.unwrap();
    assert_eq!(last.phase, SessionPhase::InProgress);

    let stored = repo
        .load_checkpoint(candidate().id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.attempt_id, saved.attempt_id);
    assert_eq!(stored.remaining_secs, 900);
    assert_eq!(stored.time_ledger.as_slice(), &[30, 45, 0]);
    assert!(sink.delivered().is_empty());
}

#[tokio::test]
async fn checkpoint_from_another_day_is_not_resumed() {
    let repo = InMemoryRepository::new();
    let sink = MemoryResultSink::new();
    let stale = in_progress(120, vec![30, 45, 0]);
    repo.save_checkpoint(&stale).await.unwrap();

    let tomorrow = fixed_now() + chrono::Duration::days(1);
    let svc = service(&repo, &sink, Clock::fixed(tomorrow));
    let session = svc.open_session(paper(1800), candidate()).await;

    assert_eq!(session.remaining_secs(), 1800);
    assert_ne!(session.attempt_id(), stale.attempt_id);
    assert!(repo.load_checkpoint(candidate().id()).await.unwrap().is_none());
}

#[tokio::test]
async fn submitted_checkpoint_is_honored_on_any_day() {
    let repo = InMemoryRepository::new();
    let sink = MemoryResultSink::new();

    let first = service(&repo, &sink, Clock::fixed(fixed_now()));
    let (handle, task) = first.start(paper(600), candidate()).await;
    handle.submit().await.unwrap();
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    let later = fixed_now() + chrono::Duration::days(3);
    let second = service(&repo, &sink, Clock::fixed(later));
    let (handle, task) = second.start(paper(600), candidate()).await;
    assert!(handle.wait_submitted().await);
    assert!(matches!(
        handle.apply(SessionCommand::Focus(0)).await,
        Err(SessionServiceError::Domain(_))
    ));
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(sink.delivered().len(), 1);
    assert!(
        second
            .stored_submission(candidate().id())
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn exhausted_budget_times_out_on_start() {
    let repo = InMemoryRepository::new();
    let sink = MemoryResultSink::new();
    let mut saved = in_progress(0, vec![30, 45, 0]);
    saved.responses.insert(2, Answer::Numeric("42".into()));
    repo.save_checkpoint(&saved).await.unwrap();

    let svc = service(&repo, &sink, Clock::fixed(fixed_now()));
    let (handle, task) = svc.start(paper(600), candidate()).await;

    assert!(handle.wait_submitted().await);
    drop(handle);
    let last = task.await.unwrap();

    let submission = last.submission.unwrap();
    assert_eq!(submission.reason, SubmitReason::Timeout);
    assert_eq!(submission.result.score, 4);
    assert_eq!(sink.delivered().len(), 1);
}

#[tokio::test]
async fn countdown_expires_in_real_time() {
    let repo = InMemoryRepository::new();
    let sink = MemoryResultSink::new();
    let svc = service(&repo, &sink, Clock::default_clock());

    let (handle, task) = svc.start(paper(1), candidate()).await;
    let submitted = tokio::time::timeout(Duration::from_secs(5), handle.wait_submitted())
        .await
        .expect("timer should expire");
    assert!(submitted);

    let progress = handle.snapshot().await.unwrap();
    assert_eq!(progress.remaining_secs, 0);
    drop(handle);
    task.await.unwrap();

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].reason, SubmitReason::Timeout);
    assert_eq!(
        delivered[0]
            .answers
            .iter()
            .map(|q| u64::from(q.time_spent_secs))
            .sum::<u64>(),
        1
    );
}

#[tokio::test]
async fn failing_store_does_not_block_submission() {
    let sink = MemoryResultSink::new();
    let svc = ExamSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(FailingRepository),
        Arc::new(sink.clone()),
    );

    let (handle, task) = svc.start(paper(600), candidate()).await;
    handle
        .apply(SessionCommand::SetNumeric {
            question: 2,
            raw: "42".into(),
        })
        .await
        .unwrap();
    let progress = handle.submit().await.unwrap();
    assert!(progress.is_submitted());
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(sink.delivered().len(), 1);
    assert_eq!(sink.delivered()[0].score, 4);
}

#[tokio::test]
async fn failing_sink_does_not_undo_submission() {
    let repo = InMemoryRepository::new();
    let svc = ExamSessionService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(FailingSink),
    );

    let (handle, task) = svc.start(paper(600), candidate()).await;
    handle.submit().await.unwrap();
    handle.shutdown().await.unwrap();
    let last = task.await.unwrap();

    assert!(last.is_submitted());
    let stored = repo
        .load_checkpoint(candidate().id())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_submitted());
}
