//! Engine pool
//!
//! A fixed-size set of workers for one language pair, selected round-robin.
//! Construction is all-or-nothing: every worker must reach `InitSuccess`
//! before the pool is exposed, and any failure terminates the siblings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use anuvaad_core::{LanguagePair, RuntimeFactory};

use crate::messages::{
    InitRequest, ModelPayload, TranslationId, TranslationRequest, WorkerCommand, WorkerEvent,
    WorkerMessage,
};
use crate::worker::WorkerHandle;
use crate::{EngineError, Result};

/// Round-robin pool of inference workers for one pair.
#[derive(Debug)]
pub struct EnginePool {
    pair: LanguagePair,
    workers: Vec<WorkerHandle>,
    rr: AtomicUsize,
    pivoting: bool,
}

impl EnginePool {
    /// Build a pool of `size` workers, each loading its own copy of
    /// `models`. Returns the pool and the worker event stream; events
    /// after construction (responses, errors, faults) arrive there.
    pub async fn build(
        pair: LanguagePair,
        models: Vec<ModelPayload>,
        factory: Arc<dyn RuntimeFactory>,
        size: usize,
        init_timeout: Duration,
        cache_size: usize,
    ) -> Result<(Self, UnboundedReceiver<WorkerMessage>)> {
        if size == 0 {
            return Err(EngineError::Init("pool size must be at least 1".to_string()));
        }

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(WorkerHandle::spawn(id, factory.clone(), events_tx.clone())?);
        }
        let pivoting = models.len() == 2;

        let handshake = tokio::time::timeout(init_timeout, async {
            let mut initialized = 0usize;
            while initialized < size {
                let Some(WorkerMessage { worker, event }) = events_rx.recv().await else {
                    return Err(EngineError::Init(
                        "worker event channel closed during construction".to_string(),
                    ));
                };
                match event {
                    WorkerEvent::Ready => {
                        workers[worker].send(WorkerCommand::Init(InitRequest {
                            source_language: pair.from.clone(),
                            target_language: pair.to.clone(),
                            models: models.clone(),
                            cache_size,
                        }))?;
                    }
                    WorkerEvent::InitSuccess => initialized += 1,
                    WorkerEvent::InitError { error } => return Err(EngineError::Init(error)),
                    WorkerEvent::Fatal { error } => return Err(EngineError::Init(error)),
                    other => {
                        tracing::warn!(
                            worker,
                            event = ?other,
                            "Unexpected worker event during construction"
                        );
                    }
                }
            }
            Ok(())
        })
        .await;

        match handshake {
            Ok(Ok(())) => {
                tracing::info!(
                    pair = %pair.key(),
                    workers = size,
                    pivoting,
                    "Engine pool ready"
                );
                Ok((
                    Self {
                        pair,
                        workers,
                        rr: AtomicUsize::new(0),
                        pivoting,
                    },
                    events_rx,
                ))
            }
            Ok(Err(e)) => {
                for worker in &workers {
                    worker.terminate();
                }
                Err(e)
            }
            Err(_) => {
                for worker in &workers {
                    worker.terminate();
                }
                Err(EngineError::InitTimeout(init_timeout))
            }
        }
    }

    /// Dispatch one request to the next worker in round-robin order.
    pub fn submit(&self, request: TranslationRequest) -> Result<()> {
        let index = self.rr.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        self.workers[index].send(WorkerCommand::Translate(request))
    }

    /// Clear every worker's queue; each acknowledges with `Discarded`.
    pub fn discard(&self) {
        for worker in &self.workers {
            let _ = worker.send(WorkerCommand::DiscardQueue);
        }
    }

    /// Remove a still-queued task wherever it is queued.
    pub fn cancel(&self, translation_id: TranslationId) {
        for worker in &self.workers {
            let _ = worker.send(WorkerCommand::CancelOne { translation_id });
        }
    }

    /// Terminate every worker.
    pub fn terminate(&self) {
        for worker in &self.workers {
            worker.terminate();
        }
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn is_pivoting(&self) -> bool {
        self.pivoting
    }
}
