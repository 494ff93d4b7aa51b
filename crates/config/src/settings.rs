//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{cache, detection, endpoints, workers};
use crate::ConfigError;

/// Logging verbosity for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// Directive for a `tracing` env filter; subscriber installation
    /// belongs to the embedding application.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Disable all network requests; any required fetch fails.
    #[serde(default)]
    pub offline: bool,

    /// Engine pool size per language pair.
    #[serde(default = "default_workers_per_pair")]
    pub workers_per_pair: usize,

    /// Idle eviction timeout in minutes; `0` (or negative) disables
    /// eviction entirely.
    #[serde(default = "default_idle_timeout_min")]
    pub idle_timeout_min: f64,

    /// Sweep interval for the idle-eviction task (ms).
    #[serde(default = "default_memory_check_interval_ms")]
    pub memory_check_interval_ms: u64,

    /// Minimum interval between idle-deadline re-arms (ms).
    #[serde(default = "default_timeout_reset_threshold_ms")]
    pub timeout_reset_threshold_ms: u64,

    /// Bound on engine pool construction (ms).
    #[serde(default = "default_worker_init_timeout_ms")]
    pub worker_init_timeout_ms: u64,

    /// Detection input truncation (characters).
    #[serde(default = "default_max_detection_length")]
    pub max_detection_length: usize,

    /// Persistent cache root for catalog, flags, and model artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Model catalog URL.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Base URL for artifact downloads.
    #[serde(default = "default_artifacts_base_url")]
    pub artifacts_base_url: String,

    /// Logging verbosity.
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_workers_per_pair() -> usize {
    workers::WORKERS_PER_PAIR
}

fn default_idle_timeout_min() -> f64 {
    cache::IDLE_TIMEOUT_MIN
}

fn default_memory_check_interval_ms() -> u64 {
    cache::MEMORY_CHECK_INTERVAL_MS
}

fn default_timeout_reset_threshold_ms() -> u64 {
    cache::TIMEOUT_RESET_THRESHOLD_MS
}

fn default_worker_init_timeout_ms() -> u64 {
    workers::WORKER_INIT_TIMEOUT_MS
}

fn default_max_detection_length() -> usize {
    detection::MAX_DETECTION_LENGTH
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("anuvaad-data")
}

fn default_catalog_url() -> String {
    endpoints::CATALOG_DEFAULT.clone()
}

fn default_artifacts_base_url() -> String {
    endpoints::ARTIFACTS_DEFAULT.clone()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            offline: false,
            workers_per_pair: default_workers_per_pair(),
            idle_timeout_min: default_idle_timeout_min(),
            memory_check_interval_ms: default_memory_check_interval_ms(),
            timeout_reset_threshold_ms: default_timeout_reset_threshold_ms(),
            worker_init_timeout_ms: default_worker_init_timeout_ms(),
            max_detection_length: default_max_detection_length(),
            data_dir: default_data_dir(),
            catalog_url: default_catalog_url(),
            artifacts_base_url: default_artifacts_base_url(),
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers_per_pair < 1 {
            return Err(ConfigError::InvalidValue {
                field: "workers_per_pair".to_string(),
                message: "pool size must be at least 1".to_string(),
            });
        }

        if self.memory_check_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "memory_check_interval_ms".to_string(),
                message: "sweep interval must be positive".to_string(),
            });
        }

        if self.worker_init_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker_init_timeout_ms".to_string(),
                message: "worker init timeout must be positive".to_string(),
            });
        }

        if self.max_detection_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_detection_length".to_string(),
                message: "detection length must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Idle timeout as a duration; `None` disables eviction.
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_min <= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(self.idle_timeout_min * 60.0))
        }
    }

    pub fn memory_check_interval(&self) -> Duration {
        Duration::from_millis(self.memory_check_interval_ms)
    }

    pub fn timeout_reset_threshold(&self) -> Duration {
        Duration::from_millis(self.timeout_reset_threshold_ms)
    }

    pub fn worker_init_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_init_timeout_ms)
    }
}

/// Load settings from an optional file plus `ANUVAAD_`-prefixed
/// environment variables. Environment variables win over the file; the
/// file wins over built-in defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(File::from(path));
    }

    let config = builder
        .add_source(Environment::with_prefix("ANUVAAD"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;

    tracing::debug!(
        offline = settings.offline,
        workers_per_pair = settings.workers_per_pair,
        data_dir = %settings.data_dir.display(),
        "Configuration loaded"
    );

    Ok(settings)
}
