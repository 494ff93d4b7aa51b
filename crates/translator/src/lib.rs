//! Translation coordinator for the Anuvaad translation service
//!
//! The public surface of the system:
//! - `Translator` — planning, routing, pivoting, detection, dispatch
//! - `EngineCache` — pair-keyed engine pools with idle eviction
//! - `LanguageDetector` — short-text language identification
//! - `Texts` — scalar-or-list inputs with shape preservation

pub mod cache;
pub mod detect;
mod pending;
pub mod plan;
pub mod texts;
mod translator;

pub use cache::{CacheEntry, EngineCache, EntryStats};
pub use detect::LanguageDetector;
pub use plan::Plan;
pub use texts::Texts;
pub use translator::{TranslationHandle, Translator, TranslatorStats};

use thiserror::Error;

use anuvaad_core::ScriptError;
use anuvaad_engine::EngineError;
use anuvaad_models::ModelStoreError;

/// Coordinator errors; the error type of the public API.
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("unsupported language: {0}")]
    InvalidLanguage(String),

    #[error(transparent)]
    Models(#[from] ModelStoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("translator shut down")]
    Shutdown,
}

impl TranslatorError {
    /// Whether this is a cooperative cancellation rather than a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Shutdown
                | Self::Engine(EngineError::Cancelled)
                | Self::Engine(EngineError::Discarded)
        )
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
