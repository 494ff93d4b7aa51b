//! Sandboxed inference runtime interface
//!
//! A worker hands the factory a fully prepared [`EngineSetup`]: the
//! generated inference configuration text, the GEMM precision mode, and
//! the model payloads already copied into aligned memory. Ownership of the
//! memory transfers to the runtime instance, which releases it on drop.

use thiserror::Error;

use crate::memory::AlignedBuf;
use crate::model::FileKind;

/// Inference runtime failure.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// Engine construction failed; fatal for the worker being initialized.
    #[error("engine construction failed: {0}")]
    Construct(String),

    /// A single inference call failed; fails that request only.
    #[error("inference failed: {0}")]
    Inference(String),
}

/// GEMM precision mode selected from the model file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemmPrecision {
    Int8ShiftAll,
    Int8ShiftAlphaAll,
}

impl GemmPrecision {
    /// Select the precision mode for a model binary by its file name.
    pub fn for_model_file(name: &str) -> Self {
        if name.ends_with("intgemm8.bin") {
            Self::Int8ShiftAll
        } else {
            Self::Int8ShiftAlphaAll
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8ShiftAll => "int8shiftAll",
            Self::Int8ShiftAlphaAll => "int8shiftAlphaAll",
        }
    }
}

/// One model payload in the runtime's aligned memory.
#[derive(Debug)]
pub struct ModelMemory {
    pub kind: FileKind,
    /// Artifact file name, as listed in the catalog.
    pub name: String,
    pub data: AlignedBuf,
}

/// One loaded translation model: its configuration and memory.
#[derive(Debug)]
pub struct LoadedModel {
    /// Inference configuration in text form (the knob set is a protocol
    /// contract with the runtime).
    pub config_text: String,
    pub precision: GemmPrecision,
    pub memory: Vec<ModelMemory>,
}

/// Everything the factory needs to build one blocking translation service.
#[derive(Debug)]
pub struct EngineSetup {
    pub source_language: String,
    pub target_language: String,
    /// One model for a direct engine, two for a pivoting engine
    /// (source→pivot, pivot→target). Never more than two.
    pub models: Vec<LoadedModel>,
    /// Translation cache size inside the blocking service. 0 disables
    /// caching at this layer; the coordinator above is the source of
    /// truth for caching.
    pub cache_size: usize,
}

impl EngineSetup {
    pub fn is_pivoting(&self) -> bool {
        self.models.len() == 2
    }
}

/// A blocking translation service instance owned by one worker.
///
/// Calls run on the worker's own thread; the instance is never shared.
pub trait TranslationRuntime: Send {
    /// Translate through the single loaded model.
    fn translate(&mut self, texts: &[String], html: bool) -> Result<Vec<String>, RuntimeError>;

    /// Translate through both loaded models, source→pivot→target.
    fn translate_pivot(
        &mut self,
        texts: &[String],
        html: bool,
    ) -> Result<Vec<String>, RuntimeError>;
}

/// Builds runtime instances from prepared engine setups.
pub trait RuntimeFactory: Send + Sync {
    fn create(&self, setup: EngineSetup) -> Result<Box<dyn TranslationRuntime>, RuntimeError>;

    /// Runtime name for logging.
    fn name(&self) -> &str;
}
