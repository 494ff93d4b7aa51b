//! Shared test doubles for the engine crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anuvaad_core::{EngineSetup, FileKind, RuntimeError, RuntimeFactory, TranslationRuntime};

use crate::messages::{ModelPayload, PayloadFile};

/// Deterministic runtime that tags texts with its language pair.
pub(crate) struct EchoRuntime {
    source: String,
    target: String,
}

impl TranslationRuntime for EchoRuntime {
    fn translate(&mut self, texts: &[String], _html: bool) -> Result<Vec<String>, RuntimeError> {
        Ok(texts
            .iter()
            .map(|t| format!("[{}-{}] {t}", self.source, self.target))
            .collect())
    }

    fn translate_pivot(
        &mut self,
        texts: &[String],
        _html: bool,
    ) -> Result<Vec<String>, RuntimeError> {
        Ok(texts
            .iter()
            .map(|t| format!("[{}-en-{}] {t}", self.source, self.target))
            .collect())
    }
}

/// Factory producing [`EchoRuntime`] instances, with optional failure
/// injection and a creation counter.
#[derive(Default)]
pub(crate) struct EchoFactory {
    pub fail_create: bool,
    pub created: Arc<AtomicUsize>,
}

impl RuntimeFactory for EchoFactory {
    fn create(&self, setup: EngineSetup) -> Result<Box<dyn TranslationRuntime>, RuntimeError> {
        if self.fail_create {
            return Err(RuntimeError::Construct("injected failure".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(EchoRuntime {
            source: setup.source_language,
            target: setup.target_language,
        }))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// A minimal valid payload (model + shared vocab) for one pair.
pub(crate) fn direct_payload(from: &str, to: &str) -> ModelPayload {
    ModelPayload {
        files: vec![
            PayloadFile {
                kind: FileKind::Model,
                name: format!("model.{from}-{to}.intgemm8.bin"),
                bytes: vec![1u8; 16],
            },
            PayloadFile {
                kind: FileKind::Vocab,
                name: format!("vocab.{from}-{to}.spm"),
                bytes: vec![2u8; 16],
            },
        ],
    }
}
