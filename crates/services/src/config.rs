use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DB_URL_VAR: &str = "EXAM_DB_URL";
pub const RESULT_SINK_URL_VAR: &str = "EXAM_RESULT_SINK_URL";
pub const TICK_MS_VAR: &str = "EXAM_TICK_MS";
pub const DELIVERY_TIMEOUT_MS_VAR: &str = "EXAM_DELIVERY_TIMEOUT_MS";

pub const DEFAULT_DB_URL: &str = "sqlite:exam.sqlite3";
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings for the session engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamConfig {
    pub db_url: String,
    /// Where results are POSTed; results are only logged when unset.
    pub result_sink_url: Option<Url>,
    pub tick_interval: Duration,
    /// Upper bound on waiting for result deliveries when a driver exits.
    pub delivery_timeout: Duration,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            result_sink_url: None,
            tick_interval: DEFAULT_TICK,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }
}

impl ExamConfig {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            db_url: get(DB_URL_VAR).unwrap_or(defaults.db_url),
            result_sink_url: get(RESULT_SINK_URL_VAR)
                .map(|raw| parse_sink_url(RESULT_SINK_URL_VAR, &raw))
                .transpose()?,
            tick_interval: get(TICK_MS_VAR)
                .map(|raw| parse_millis(TICK_MS_VAR, &raw))
                .transpose()?
                .unwrap_or(defaults.tick_interval),
            delivery_timeout: get(DELIVERY_TIMEOUT_MS_VAR)
                .map(|raw| parse_millis(DELIVERY_TIMEOUT_MS_VAR, &raw))
                .transpose()?
                .unwrap_or(defaults.delivery_timeout),
        })
    }
}

/// Parses an http(s) endpoint for result delivery.
///
/// # Errors
///
/// Returns `ConfigError` for unparsable URLs and non-http schemes.
pub fn parse_sink_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { var, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            var,
            scheme: other.to_string(),
        }),
    }
}

fn parse_millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidMillis {
            var,
            value: raw.to_string(),
        }),
    }
}
