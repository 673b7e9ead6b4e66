#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod paper;
pub mod sessions;
pub mod sink;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use config::ExamConfig;
pub use error::{AppServicesError, ConfigError, PaperLoadError, SessionServiceError, SinkError};
pub use paper::{load_paper, parse_paper};
pub use sessions::{ExamSessionService, SessionDriver, SessionHandle, SessionProgress};
pub use sink::{HttpResultSink, LogResultSink, MemoryResultSink, ResultNotification, ResultSink};
