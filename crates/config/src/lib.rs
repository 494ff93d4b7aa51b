//! Configuration management for the Anuvaad translation service
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (ANUVAAD_ prefix)
//! - Built-in defaults

pub mod constants;
pub mod settings;

pub use settings::{load_settings, LogLevel, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
