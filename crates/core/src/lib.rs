//! Core types for the Anuvaad translation service
//!
//! This crate provides foundational types used across all other crates:
//! - Language tags, pairs, aliases, and Han-script conversion tables
//! - Model file kinds and their sandbox alignment requirements
//! - Aligned byte buffers for model memory
//! - Traits for pluggable external collaborators (inference runtime,
//!   Han-script converter)

pub mod language;
pub mod memory;
pub mod model;
pub mod traits;

pub use language::{
    canonicalize, from_hans, is_han, is_han_variant, to_hans, HanConversion, LanguagePair,
    ALIASES, AUTO, ENGLISH, HAN_VARIANTS, SIMPLIFIED_CHINESE,
};
pub use memory::AlignedBuf;
pub use model::FileKind;
pub use traits::{
    EngineSetup, GemmPrecision, LoadedModel, ModelMemory, RuntimeError, RuntimeFactory,
    ScriptConverter, ScriptError, TranslationRuntime,
};
