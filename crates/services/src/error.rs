//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use exam_core::model::PaperError;
use exam_core::session::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by result sinks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("result endpoint responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while reading a paper file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PaperLoadError {
    #[error("failed to read paper {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("paper is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] PaperError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} must use http or https, got {scheme}")]
    UnsupportedScheme { var: &'static str, scheme: String },
    #[error("{var} must be a positive number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },
}

/// Errors emitted by the session service and its driver handle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error(transparent)]
    Domain(#[from] exam_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("session driver has stopped")]
    DriverStopped,
}

impl From<SessionError> for SessionServiceError {
    fn from(err: SessionError) -> Self {
        Self::Domain(err.into())
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
