//! Where submitted results are reported.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{AttemptId, Candidate, Marks, QuestionResult, SubmitReason, Submission};
use reqwest::Client;
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::error::SinkError;

/// Payload handed to a sink once per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultNotification {
    pub name: String,
    pub id: String,
    pub attempt_id: AttemptId,
    pub reason: SubmitReason,
    pub submitted_at: DateTime<Utc>,
    pub score: Marks,
    pub attempted: u32,
    pub correct: u32,
    pub wrong: u32,
    pub partial: u32,
    pub unattempted: u32,
    pub answers: Vec<QuestionResult>,
}

impl ResultNotification {
    #[must_use]
    pub fn new(candidate: &Candidate, attempt_id: AttemptId, submission: &Submission) -> Self {
        let result = &submission.result;
        Self {
            name: candidate.name().to_string(),
            id: candidate.id().to_string(),
            attempt_id,
            reason: submission.reason,
            submitted_at: submission.submitted_at,
            score: result.score,
            attempted: result.attempted,
            correct: result.correct,
            wrong: result.wrong,
            partial: result.partial,
            unattempted: result.unattempted,
            answers: result.questions.clone(),
        }
    }
}

/// Receives results after submission. Failures never undo a submission.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if delivery fails.
    async fn deliver(&self, notification: &ResultNotification) -> Result<(), SinkError>;
}

/// POSTs the notification as JSON; any non-2xx status is an error.
#[derive(Clone)]
pub struct HttpResultSink {
    client: Client,
    endpoint: Url,
}

impl HttpResultSink {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl ResultSink for HttpResultSink {
    async fn deliver(&self, notification: &ResultNotification) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(notification)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

/// Logs the result and nothing else; used when no endpoint is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogResultSink;

#[async_trait]
impl ResultSink for LogResultSink {
    async fn deliver(&self, notification: &ResultNotification) -> Result<(), SinkError> {
        info!(
            candidate = %notification.id,
            attempt = %notification.attempt_id,
            score = notification.score,
            reason = ?notification.reason,
            "result recorded"
        );
        Ok(())
    }
}

/// Keeps every delivery in memory.
#[derive(Clone, Default)]
pub struct MemoryResultSink {
    delivered: Arc<Mutex<Vec<ResultNotification>>>,
}

impl MemoryResultSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries so far, oldest first.
    #[must_use]
    pub fn delivered(&self) -> Vec<ResultNotification> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultSink for MemoryResultSink {
    async fn deliver(&self, notification: &ResultNotification) -> Result<(), SinkError> {
        if let Ok(mut guard) = self.delivered.lock() {
            guard.push(notification.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use exam_core::model::{ExamResult, Outcome, QuestionId};
    use exam_core::time::fixed_now;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn notification() -> ResultNotification {
        let candidate = Candidate::new("JEE-7", "Asha").unwrap();
        let submission = Submission {
            reason: SubmitReason::Timeout,
            submitted_at: fixed_now(),
            result: ExamResult {
                score: 3,
                attempted: 1,
                correct: 1,
                questions: vec![QuestionResult {
                    number: 1,
                    question_id: QuestionId::new(11),
                    outcome: Outcome::Correct,
                    marks: 3,
                    time_spent_secs: 40,
                    answer: None,
                }],
                ..ExamResult::default()
            },
        };
        ResultNotification::new(&candidate, AttemptId::generate(), &submission)
    }

    #[tokio::test]
    async fn http_sink_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/results"))
            .and(body_partial_json(serde_json::json!({
                "name": "Asha",
                "id": "JEE-7",
                "reason": "timeout",
                "score": 3
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Url::parse(&format!("{}/results", server.uri())).unwrap();
        HttpResultSink::new(endpoint)
            .deliver(&notification())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn http_sink_rejects_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let endpoint = Url::parse(&server.uri()).unwrap();
        let err = HttpResultSink::new(endpoint)
            .deliver(&notification())
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::HttpStatus(status) if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn memory_sink_records_deliveries() {
        let sink = MemoryResultSink::new();
        sink.deliver(&notification()).await.unwrap();
        assert_eq!(sink.delivered().len(), 1);
        assert_eq!(sink.delivered()[0].answers[0].time_spent_secs, 40);
    }
}
