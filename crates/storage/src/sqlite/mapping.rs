use exam_core::model::{AttemptId, CandidateId, SessionCheckpoint, SessionPhase};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::types::Uuid;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn parse_phase(s: &str) -> Result<SessionPhase, StorageError> {
    match s {
        "not_started" => Ok(SessionPhase::NotStarted),
        "in_progress" => Ok(SessionPhase::InProgress),
        "submitted" => Ok(SessionPhase::Submitted),
        _ => Err(StorageError::Serialization(format!("invalid phase: {s}"))),
    }
}

pub(crate) fn to_json<T: Serialize>(field: &'static str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_checkpoint_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionCheckpoint, StorageError> {
    let candidate_id = CandidateId::parse(row.try_get::<String, _>("candidate_id").map_err(ser)?)
        .map_err(ser)?;
    let attempt_id = AttemptId::from_uuid(row.try_get::<Uuid, _>("attempt_id").map_err(ser)?);

    let phase_str: String = row.try_get("phase").map_err(ser)?;
    let phase = parse_phase(phase_str.as_str())?;

    let current_index = usize::try_from(row.try_get::<i64, _>("current_index").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("invalid current_index".into()))?;

    let submission = row
        .try_get::<Option<String>, _>("submission")
        .map_err(ser)?
        .map(|raw| from_json("submission", &raw))
        .transpose()?;

    Ok(SessionCheckpoint {
        candidate_id,
        attempt_id,
        phase,
        remaining_secs: u32_from_i64(
            "remaining_secs",
            row.try_get::<i64, _>("remaining_secs").map_err(ser)?,
        )?,
        time_ledger: from_json(
            "time_ledger",
            &row.try_get::<String, _>("time_ledger").map_err(ser)?,
        )?,
        current_index,
        responses: from_json("responses", &row.try_get::<String, _>("responses").map_err(ser)?)?,
        review: from_json("review", &row.try_get::<String, _>("review").map_err(ser)?)?,
        submission,
        saved_at: row.try_get("saved_at").map_err(ser)?,
    })
}
