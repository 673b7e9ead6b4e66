use thiserror::Error;

use crate::model::{CandidateError, PaperError};
use crate::session::SessionError;

/// Any domain failure, for callers that do not care which layer raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Paper(#[from] PaperError),
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
