//! Layered configuration loading using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TIMETABLE_*` prefix, `__` as separator)
//! 2. `timetable.toml` in the working directory (or an explicit path)
//! 3. Built-in defaults
//!
//! Figment maps `TIMETABLE_CONFLICTS__MATCH_MODE` -> `conflicts.match_mode`,
//! `TIMETABLE_LOCKING__RETRY_DELAY_MS` -> `locking.retry_delay_ms`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::conflict::MatchMode;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "timetable.toml";

const fn default_true() -> bool {
    true
}

const fn default_retry_delay_ms() -> u64 {
    5
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimetableConfig {
    #[serde(default)]
    pub conflicts: ConflictConfig,
    #[serde(default)]
    pub locking: LockConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConflictConfig {
    /// How slot times are compared.
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Conflict-check reschedule/makeup replacements, and check new entries
    /// against recorded replacements.
    #[serde(default = "default_true")]
    pub check_exceptions: bool,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            check_exceptions: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LockConfig {
    /// Back-off between lock attempts while a caller deadline is in force.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl TimetableConfig {
    /// Load from defaults, `timetable.toml` and `TIMETABLE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load using an explicit TOML file instead of `timetable.toml`.
    ///
    /// A missing file is skipped.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so callers can layer additional providers on top.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let path = path.as_ref();
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("TIMETABLE_").split("__"))
    }

    /// Rejects values that would make the service misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locking.retry_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "locking.retry_delay_ms".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Lock retry back-off as a duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.locking.retry_delay_ms)
    }
}
