//! Han-script converter interface

use thiserror::Error;

use crate::language::HanConversion;

/// Script conversion failure.
#[derive(Error, Debug, Clone)]
#[error("script conversion failed: {0}")]
pub struct ScriptError(pub String);

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A deterministic text transform between Chinese script variants.
///
/// Implementations must be pure: the same input always produces the same
/// output, and no state is carried between calls.
pub trait ScriptConverter: Send + Sync {
    /// Apply the named conversion scheme to `text`.
    fn convert(&self, conversion: HanConversion, text: &str) -> Result<String, ScriptError>;

    /// Converter name for logging.
    fn name(&self) -> &str {
        "script-converter"
    }
}
