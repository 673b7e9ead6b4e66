use async_trait::async_trait;
use exam_core::model::{CandidateId, SessionCheckpoint};

use super::SqliteRepository;
use super::mapping::{map_checkpoint_row, to_json};
use crate::repository::{CheckpointRepository, StorageError};

#[async_trait]
impl CheckpointRepository for SqliteRepository {
    async fn load_checkpoint(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<SessionCheckpoint>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT candidate_id, attempt_id, phase, remaining_secs, current_index,
                   time_ledger, responses, review, submission, saved_at
            FROM exam_checkpoints
            WHERE candidate_id = ?1
            ",
        )
        .bind(candidate.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_checkpoint_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn save_checkpoint(&self, checkpoint: &SessionCheckpoint) -> Result<(), StorageError> {
        let current_index = i64::try_from(checkpoint.current_index)
            .map_err(|_| StorageError::Serialization("current_index overflow".into()))?;
        let submission = checkpoint
            .submission
            .as_ref()
            .map(|s| to_json("submission", s))
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO exam_checkpoints (
                candidate_id, attempt_id, phase, remaining_secs, current_index,
                time_ledger, responses, review, submission, saved_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(candidate_id) DO UPDATE SET
                attempt_id = excluded.attempt_id,
                phase = excluded.phase,
                remaining_secs = excluded.remaining_secs,
                current_index = excluded.current_index,
                time_ledger = excluded.time_ledger,
                responses = excluded.responses,
                review = excluded.review,
                submission = excluded.submission,
                saved_at = excluded.saved_at
            ",
        )
        .bind(checkpoint.candidate_id.as_str())
        .bind(checkpoint.attempt_id.value())
        .bind(checkpoint.phase.as_str())
        .bind(i64::from(checkpoint.remaining_secs))
        .bind(current_index)
        .bind(to_json("time_ledger", &checkpoint.time_ledger)?)
        .bind(to_json("responses", &checkpoint.responses)?)
        .bind(to_json("review", &checkpoint.review)?)
        .bind(submission)
        .bind(checkpoint.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_checkpoint(&self, candidate: &CandidateId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM exam_checkpoints WHERE candidate_id = ?1")
            .bind(candidate.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
