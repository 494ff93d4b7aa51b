//! Coordinator ↔ worker protocol
//!
//! Workers are driven purely by messages; no shared mutable state crosses
//! the thread boundary. Commands flow coordinator→worker, events flow
//! worker→coordinator tagged with the worker index.

use uuid::Uuid;

use anuvaad_core::FileKind;

/// Monotonically increasing id assigned by the coordinator per message.
pub type MessageId = u64;

/// Unique-per-request opaque id.
pub type TranslationId = Uuid;

/// One artifact payload carried into a worker.
#[derive(Debug, Clone)]
pub struct PayloadFile {
    pub kind: FileKind,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// All artifacts for one model. A direct engine carries one of these, a
/// pivoting engine two.
#[derive(Debug, Clone, Default)]
pub struct ModelPayload {
    pub files: Vec<PayloadFile>,
}

impl ModelPayload {
    /// File name of the model binary, used for GEMM precision selection.
    pub fn model_file_name(&self) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.kind == FileKind::Model)
            .map(|f| f.name.as_str())
    }

    pub fn contains(&self, kind: FileKind) -> bool {
        self.files.iter().any(|f| f.kind == kind)
    }
}

/// Initialize a worker with its engine models.
#[derive(Debug, Clone)]
pub struct InitRequest {
    pub source_language: String,
    pub target_language: String,
    pub models: Vec<ModelPayload>,
    /// Cache size for the blocking service; 0 disables caching at that
    /// layer.
    pub cache_size: usize,
}

/// One translation task for a worker.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub message_id: MessageId,
    pub translation_id: TranslationId,
    pub source_text: String,
    pub is_html: bool,
}

/// Completed translation from a worker.
#[derive(Debug, Clone)]
pub struct TranslationResponse {
    pub message_id: MessageId,
    pub translation_id: TranslationId,
    pub target_text: String,
    /// Time spent inside the inference call.
    pub inference_millis: u64,
}

/// Why a single task failed.
#[derive(Debug, Clone)]
pub enum TaskError {
    /// Removed from the queue before it ran.
    Cancelled,
    /// The inference runtime rejected it.
    Runtime(String),
}

/// Coordinator → worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Init(InitRequest),
    Translate(TranslationRequest),
    /// Drop every queued task; in-flight work finishes.
    DiscardQueue,
    /// Remove one queued task; an in-flight task runs to completion.
    CancelOne { translation_id: TranslationId },
    Terminate,
}

/// Worker → coordinator.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Runtime loaded, awaiting `Init`. Emitted once.
    Ready,
    /// Models constructed. Emitted once.
    InitSuccess,
    /// Engine construction failed; the worker terminates.
    InitError { error: String },
    Response(TranslationResponse),
    TranslationError {
        message_id: MessageId,
        error: TaskError,
    },
    /// Queue cleared after `DiscardQueue`.
    Discarded,
    /// The worker died unexpectedly; fatal for its pool.
    Fatal { error: String },
}

/// A worker event tagged with its pool index.
#[derive(Debug)]
pub struct WorkerMessage {
    pub worker: usize,
    pub event: WorkerEvent,
}
