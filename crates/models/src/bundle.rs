//! Model bundles
//!
//! A bundle is everything one engine needs for one language pair, loaded
//! into memory and already checksum-verified.

use std::collections::HashMap;

use anuvaad_core::{FileKind, LanguagePair};

use crate::{ModelStoreError, Result};

/// One verified artifact, loaded into memory.
#[derive(Debug, Clone)]
pub struct ModelFile {
    pub kind: FileKind,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// All artifacts for one language pair.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub pair: LanguagePair,
    files: HashMap<FileKind, ModelFile>,
}

impl ModelBundle {
    pub fn new(pair: LanguagePair) -> Self {
        Self {
            pair,
            files: HashMap::new(),
        }
    }

    pub fn insert(&mut self, file: ModelFile) {
        self.files.insert(file.kind, file);
    }

    pub fn get(&self, kind: FileKind) -> Option<&ModelFile> {
        self.files.get(&kind)
    }

    pub fn contains(&self, kind: FileKind) -> bool {
        self.files.contains_key(&kind)
    }

    /// File name of the model binary, used for GEMM precision selection.
    pub fn model_name(&self) -> Option<&str> {
        self.get(FileKind::Model).map(|f| f.name.as_str())
    }

    pub fn files(&self) -> impl Iterator<Item = &ModelFile> {
        self.files.values()
    }

    pub fn into_files(self) -> Vec<ModelFile> {
        self.files.into_values().collect()
    }

    /// A bundle must contain a model, plus either a shared vocabulary or
    /// both split vocabularies. Lexicon and quality model are optional.
    pub fn validate(&self) -> Result<()> {
        if !self.contains(FileKind::Model) {
            return Err(self.incomplete("missing model file"));
        }

        let shared = self.contains(FileKind::Vocab);
        let split =
            self.contains(FileKind::Srcvocab) && self.contains(FileKind::Trgvocab);
        if !shared && !split {
            return Err(self.incomplete(
                "missing vocabulary: need vocab, or srcvocab and trgvocab",
            ));
        }

        Ok(())
    }

    fn incomplete(&self, message: &str) -> ModelStoreError {
        ModelStoreError::IncompleteBundle {
            pair: self.pair.key(),
            message: message.to_string(),
        }
    }
}
