use std::path::Path;

use exam_core::model::{ExamPaper, PaperDraft};
use tracing::debug;

use crate::error::PaperLoadError;

/// Read and validate a JSON paper file.
///
/// # Errors
///
/// Returns `PaperLoadError` if the file cannot be read, is not valid JSON, or
/// fails validation.
pub async fn load_paper(path: impl AsRef<Path>) -> Result<ExamPaper, PaperLoadError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PaperLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let paper = parse_paper(&raw)?;
    debug!(path = %path.display(), questions = paper.len(), "loaded paper");
    Ok(paper)
}

/// Parse and validate paper JSON.
///
/// # Errors
///
/// Returns `PaperLoadError::Parse` for malformed JSON and
/// `PaperLoadError::Invalid` for a paper that fails validation.
pub fn parse_paper(raw: &str) -> Result<ExamPaper, PaperLoadError> {
    let draft: PaperDraft = serde_json::from_str(raw)?;
    Ok(draft.validate()?)
}
