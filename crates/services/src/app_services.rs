use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::config::ExamConfig;
use crate::error::AppServicesError;
use crate::sessions::ExamSessionService;
use crate::sink::{HttpResultSink, LogResultSink, ResultSink};

/// Assembles app-facing services from configuration.
#[derive(Clone)]
pub struct AppServices {
    sessions: Arc<ExamSessionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: ExamConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        Ok(Self::with_storage(config, clock, storage))
    }

    /// Build services over an existing storage backend.
    #[must_use]
    pub fn with_storage(config: ExamConfig, clock: Clock, storage: Storage) -> Self {
        let sink: Arc<dyn ResultSink> = match &config.result_sink_url {
            Some(endpoint) => {
                info!(endpoint = %endpoint, "reporting results over HTTP");
                Arc::new(HttpResultSink::new(endpoint.clone()))
            }
            None => Arc::new(LogResultSink),
        };

        let sessions = Arc::new(
            ExamSessionService::new(clock, Arc::clone(&storage.checkpoints), sink)
                .with_tick_interval(config.tick_interval)
                .with_delivery_timeout(config.delivery_timeout),
        );

        Self { sessions }
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<ExamSessionService> {
        Arc::clone(&self.sessions)
    }
}
