//! Engine layer for the Anuvaad translation service
//!
//! Hosts the neural inference runtime in isolated workers:
//! - `worker` — one OS thread per worker, owning one runtime instance and
//!   its loaded models, driven purely by messages
//! - `queue` — time-sliced FIFO work queue with cancellation
//! - `pool` — fixed-size round-robin pool of workers for one pair
//! - `messages` — the coordinator↔worker protocol
//! - `clean` — deterministic source-text pre-processing
//! - `memory` lives in `anuvaad_core` (aligned model buffers)

pub mod clean;
pub mod messages;
#[cfg(test)]
pub(crate) mod test_util;
pub mod options;
pub mod pool;
pub mod queue;
pub mod worker;

pub use clean::{clean_source_text, CleanText};
pub use messages::{
    InitRequest, MessageId, ModelPayload, PayloadFile, TaskError, TranslationId,
    TranslationRequest, TranslationResponse, WorkerCommand, WorkerEvent, WorkerMessage,
};
pub use options::inference_config_text;
pub use pool::EnginePool;
pub use queue::{WorkQueue, BATCH_SIZE, RUN_IMMEDIATELY, TIME_BUDGET_MS};
pub use worker::WorkerHandle;

use std::time::Duration;
use thiserror::Error;

/// Engine errors
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("worker initialization timed out after {0:?}")]
    InitTimeout(Duration),

    #[error("worker initialization failed: {0}")]
    Init(String),

    #[error("translation failed: {0}")]
    Translation(String),

    #[error("translation cancelled")]
    Cancelled,

    #[error("translations discarded")]
    Discarded,

    #[error("worker terminated: {0}")]
    WorkerLost(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
