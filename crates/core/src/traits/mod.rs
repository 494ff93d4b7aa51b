//! Traits for pluggable external collaborators
//!
//! The translation core treats two capabilities as black boxes supplied by
//! the embedding application:
//!
//! - [`TranslationRuntime`] / [`RuntimeFactory`]: the sandboxed neural
//!   inference runtime hosted by each worker
//! - [`ScriptConverter`]: the deterministic Han-script transform
//!
//! Keeping these behind traits lets tests swap in mocks and lets the
//! application choose a concrete runtime without the core depending on it.

mod runtime;
mod script;

pub use runtime::{
    EngineSetup, GemmPrecision, LoadedModel, ModelMemory, RuntimeError, RuntimeFactory,
    TranslationRuntime,
};
pub use script::{ScriptConverter, ScriptError};
