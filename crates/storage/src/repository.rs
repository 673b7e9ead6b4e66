use async_trait::async_trait;
use exam_core::model::{CandidateId, SessionCheckpoint};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable session snapshots, one per candidate.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Fetch the checkpoint for a candidate, if one was saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures or a corrupt row.
    async fn load_checkpoint(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<SessionCheckpoint>, StorageError>;

    /// Insert or replace the candidate's checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the checkpoint cannot be stored.
    async fn save_checkpoint(&self, checkpoint: &SessionCheckpoint) -> Result<(), StorageError>;

    /// Remove the candidate's checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if there was nothing to delete.
    async fn delete_checkpoint(&self, candidate: &CandidateId) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    checkpoints: Arc<Mutex<HashMap<CandidateId, SessionCheckpoint>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            checkpoints: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryRepository {
    async fn load_checkpoint(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<SessionCheckpoint>, StorageError> {
        let guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(candidate).cloned())
    }

    async fn save_checkpoint(&self, checkpoint: &SessionCheckpoint) -> Result<(), StorageError> {
        let mut guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(checkpoint.candidate_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn delete_checkpoint(&self, candidate: &CandidateId) -> Result<(), StorageError> {
        let mut guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .remove(candidate)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub checkpoints: Arc<dyn CheckpointRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let checkpoints: Arc<dyn CheckpointRepository> = Arc::new(InMemoryRepository::new());
        Self { checkpoints }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::ledger::TimeLedger;
    use exam_core::model::{Answer, AttemptId, SessionPhase};
    use exam_core::time::fixed_now;
    use std::collections::{BTreeMap, BTreeSet};

    fn checkpoint(candidate: &str, remaining_secs: u32) -> SessionCheckpoint {
        let mut responses = BTreeMap::new();
        responses.insert(1, Answer::Single(2));
        SessionCheckpoint {
            candidate_id: CandidateId::parse(candidate).unwrap(),
            attempt_id: AttemptId::generate(),
            phase: SessionPhase::InProgress,
            remaining_secs,
            time_ledger: TimeLedger::from(vec![30, 45]),
            current_index: 1,
            responses,
            review: BTreeSet::new(),
            submission: None,
            saved_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn save_replaces_previous_checkpoint() {
        let repo = InMemoryRepository::new();
        let id = CandidateId::parse("c-1").unwrap();

        repo.save_checkpoint(&checkpoint("c-1", 900)).await.unwrap();
        repo.save_checkpoint(&checkpoint("c-1", 850)).await.unwrap();

        let loaded = repo.load_checkpoint(&id).await.unwrap().unwrap();
        assert_eq!(loaded.remaining_secs, 850);
        assert_eq!(loaded.responses.get(&1), Some(&Answer::Single(2)));
    }

    #[tokio::test]
    async fn checkpoints_are_keyed_by_candidate() {
        let storage = Storage::in_memory();
        storage
            .checkpoints
            .save_checkpoint(&checkpoint("c-1", 900))
            .await
            .unwrap();

        let other = CandidateId::parse("c-2").unwrap();
        assert!(storage.checkpoints.load_checkpoint(&other).await.unwrap().is_none());
        assert!(matches!(
            storage.checkpoints.delete_checkpoint(&other).await,
            Err(StorageError::NotFound)
        ));

        let id = CandidateId::parse("c-1").unwrap();
        storage.checkpoints.delete_checkpoint(&id).await.unwrap();
        assert!(storage.checkpoints.load_checkpoint(&id).await.unwrap().is_none());
    }
}
