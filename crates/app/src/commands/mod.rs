pub mod export;
pub mod result;
pub mod take;

use anyhow::{Context, Result};
use services::config::{RESULT_SINK_URL_VAR, parse_sink_url};
use services::{AppServices, Clock, ExamConfig};
use tracing::debug;

use crate::StorageArgs;
use crate::db::{normalize_sqlite_url, prepare_sqlite_file};

/// Environment settings with command-line overrides applied.
pub fn load_config(storage: &StorageArgs, sink_url: Option<&str>) -> Result<ExamConfig> {
    let mut config = ExamConfig::from_env()?;
    if let Some(db) = storage.db.as_deref().filter(|db| !db.trim().is_empty()) {
        config.db_url = db.to_string();
    }
    if let Some(raw) = sink_url {
        config.result_sink_url = Some(parse_sink_url(RESULT_SINK_URL_VAR, raw)?);
    }
    config.db_url = normalize_sqlite_url(&config.db_url);
    Ok(config)
}

/// Open (creating if needed) the database and assemble services.
pub async fn open_services(config: ExamConfig) -> Result<AppServices> {
    prepare_sqlite_file(&config.db_url)?;
    debug!(db = %config.db_url, "opening database");
    let db_url = config.db_url.clone();
    AppServices::new_sqlite(config, Clock::default_clock())
        .await
        .with_context(|| format!("opening {db_url}"))
}
