//! Model store for the Anuvaad translation service
//!
//! Resolves a language pair to a verified bundle of model artifacts:
//! - Catalog handling (`models.json`): cached on disk, refreshed over HTTP
//! - Checksum-validated artifact downloads with bounded retry
//! - Bundle assembly with required-file validation
//! - The `downloaded` flags document (`flags.json`)

pub mod bundle;
pub mod catalog;
pub mod download;
pub mod store;

pub use bundle::{ModelBundle, ModelFile};
pub use catalog::{Attachment, Catalog, ModelRecord};
pub use download::{sha256_hex, Downloader};
pub use store::{ModelStore, StoreConfig};

use thiserror::Error;

/// Model store errors
#[derive(Error, Debug)]
pub enum ModelStoreError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("no models for pair: {0}")]
    NoSuchPair(String),

    #[error("offline mode: {0}")]
    Offline(String),

    #[error("checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("incomplete bundle for {pair}: {message}")]
    IncompleteBundle { pair: String, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelStoreError>;
