//! Model artifact kinds
//!
//! Every catalog record names which role its file plays in an engine. The
//! kind also determines the alignment the sandboxed runtime requires when
//! the bytes are copied into engine memory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a model artifact within a translation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    /// The translation model binary itself.
    Model,
    /// Shortlist lexicon (optional).
    Lex,
    /// Shared source/target vocabulary.
    Vocab,
    /// Source-side vocabulary (paired with [`FileKind::Trgvocab`]).
    Srcvocab,
    /// Target-side vocabulary (paired with [`FileKind::Srcvocab`]).
    Trgvocab,
    /// Quality-estimation model (optional).
    QualityModel,
}

impl FileKind {
    /// Byte alignment the runtime requires for this kind of payload.
    pub fn alignment(&self) -> usize {
        match self {
            Self::Model => 256,
            Self::Lex | Self::Vocab | Self::Srcvocab | Self::Trgvocab | Self::QualityModel => 64,
        }
    }

    /// Catalog wire name (`fileType` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Lex => "lex",
            Self::Vocab => "vocab",
            Self::Srcvocab => "srcvocab",
            Self::Trgvocab => "trgvocab",
            Self::QualityModel => "qualityModel",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
