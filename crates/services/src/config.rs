//! Engine configuration: defaults, then an optional TOML file, then `ADAPT_*`
//! environment variables. Command-line flags are applied by the binary.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use adapt_core::quiz::DEFAULT_TIME_BUDGET_SECS;
use adapt_core::recommend::{DEFAULT_WEAK_SPOT_THRESHOLD, MilestoneForecast};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::sessions::SessionSettings;

pub const ENV_DB_URL: &str = "ADAPT_DB_URL";
pub const ENV_ATTEMPT_STORE_URL: &str = "ADAPT_ATTEMPT_STORE_URL";
pub const ENV_QUIZ_TIME_BUDGET_SECS: &str = "ADAPT_QUIZ_TIME_BUDGET_SECS";
pub const ENV_WEAK_SPOT_THRESHOLD: &str = "ADAPT_WEAK_SPOT_THRESHOLD";
pub const ENV_SUBMISSION_TIMEOUT_SECS: &str = "ADAPT_SUBMISSION_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database_url: String,
    /// Base URL of a remote attempt store. Unset means attempts are stored locally.
    pub attempt_store_url: Option<String>,
    pub quiz_time_budget_secs: u32,
    pub weak_spot_threshold: f64,
    pub forecast_near_label: String,
    pub forecast_far_label: String,
    pub submission_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://adaptive.sqlite3".into(),
            attempt_store_url: None,
            quiz_time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
            weak_spot_threshold: DEFAULT_WEAK_SPOT_THRESHOLD,
            forecast_near_label: "April 2026".into(),
            forecast_far_label: "May 2026".into(),
            submission_timeout_secs: 10,
        }
    }
}

impl EngineConfig {
    /// Defaults, overlaid with `path` if given, overlaid with the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or an
    /// environment override does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|var| std::env::var(var).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Parse`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or mistyped fields, and
    /// `ConfigError::OutOfRange` for a weak-spot threshold outside [0, 100].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        if !is_valid_threshold(config.weak_spot_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "weak_spot_threshold",
                value: config.weak_spot_threshold.to_string(),
            });
        }
        Ok(config)
    }

    /// Applies `ADAPT_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` for values that do not parse, or a
    /// weak-spot threshold outside [0, 100].
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DB_URL) {
            self.database_url = url;
        }
        if let Some(url) = lookup(ENV_ATTEMPT_STORE_URL) {
            self.attempt_store_url = (!url.trim().is_empty()).then_some(url);
        }
        if let Some(raw) = lookup(ENV_QUIZ_TIME_BUDGET_SECS) {
            self.quiz_time_budget_secs = parse_env(ENV_QUIZ_TIME_BUDGET_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WEAK_SPOT_THRESHOLD) {
            let threshold: f64 = parse_env(ENV_WEAK_SPOT_THRESHOLD, &raw)?;
            if !is_valid_threshold(threshold) {
                return Err(ConfigError::InvalidEnv {
                    var: ENV_WEAK_SPOT_THRESHOLD,
                    value: raw,
                });
            }
            self.weak_spot_threshold = threshold;
        }
        if let Some(raw) = lookup(ENV_SUBMISSION_TIMEOUT_SECS) {
            self.submission_timeout_secs = parse_env(ENV_SUBMISSION_TIMEOUT_SECS, &raw)?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }

    #[must_use]
    pub fn forecast(&self) -> MilestoneForecast {
        MilestoneForecast::new(&self.forecast_near_label, &self.forecast_far_label)
    }

    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            time_budget_secs: self.quiz_time_budget_secs,
            submission_timeout: self.submission_timeout(),
            ..SessionSettings::default()
        }
    }
}

/// Rejects NaN and infinities along with anything off the percentage scale.
fn is_valid_threshold(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

fn parse_env<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: raw.to_owned(),
    })
}
