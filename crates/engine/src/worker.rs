//! Inference worker
//!
//! One OS thread per worker, owning one sandboxed runtime instance and
//! the models loaded into it. A fault inside the runtime cannot corrupt
//! the coordinator: the boundary is message-only, and panics on the
//! worker thread surface as a `Fatal` event for the pool.
//!
//! Lifecycle: Booting → Ready → Initialized → Serving → Terminated.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use anuvaad_core::{
    AlignedBuf, EngineSetup, FileKind, GemmPrecision, LoadedModel, ModelMemory, RuntimeFactory,
    TranslationRuntime,
};

use crate::clean::clean_source_text;
use crate::messages::{
    InitRequest, TaskError, TranslationResponse, WorkerCommand, WorkerEvent, WorkerMessage,
};
use crate::options::inference_config_text;
use crate::queue::{DrainBudget, QueuedTask, WorkQueue};
use crate::{EngineError, Result};

/// Coordinator-side handle to one worker thread.
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    commands: UnboundedSender<WorkerCommand>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn a worker thread. The worker emits `Ready` on `events` once
    /// its runtime host is up.
    pub fn spawn(
        id: usize,
        factory: Arc<dyn RuntimeFactory>,
        events: UnboundedSender<WorkerMessage>,
    ) -> Result<Self> {
        let (commands, command_rx) = mpsc::unbounded_channel();

        let panic_events = events.clone();
        let thread = std::thread::Builder::new()
            .name(format!("anuvaad-worker-{id}"))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    worker_main(id, factory, command_rx, events);
                }));
                if let Err(panic) = outcome {
                    let error = panic_message(panic);
                    tracing::error!(worker = id, error = %error, "Worker thread panicked");
                    let _ = panic_events.send(WorkerMessage {
                        worker: id,
                        event: WorkerEvent::Fatal { error },
                    });
                }
            })
            .map_err(|e| EngineError::Init(format!("failed to spawn worker thread: {e}")))?;

        Ok(Self {
            id,
            commands,
            thread: Some(thread),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Send a command; fails if the worker is gone.
    pub fn send(&self, command: WorkerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::WorkerLost("command channel closed".to_string()))
    }

    /// Request termination; the thread exits after releasing its engine.
    pub fn terminate(&self) {
        let _ = self.commands.send(WorkerCommand::Terminate);
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(WorkerCommand::Terminate);
        // The thread is detached; it exits on its own after Terminate.
        self.thread.take();
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Thread entry point: Ready, then serve commands until Terminate.
fn worker_main(
    id: usize,
    factory: Arc<dyn RuntimeFactory>,
    mut commands: UnboundedReceiver<WorkerCommand>,
    events: UnboundedSender<WorkerMessage>,
) {
    let mut state = WorkerState {
        id,
        factory,
        events,
        runtime: None,
        source_language: String::new(),
        pivoting: false,
        queue: WorkQueue::new(),
        terminated: false,
    };

    state.emit(WorkerEvent::Ready);
    tracing::debug!(worker = id, "Worker ready");

    while !state.terminated {
        if state.queue.is_empty() {
            match commands.blocking_recv() {
                Some(command) => state.handle(command),
                None => break,
            }
        } else {
            state.drain(&mut commands);
        }
    }

    // Dropping the runtime releases the model handles and the service
    // instance.
    tracing::debug!(worker = id, "Worker terminated");
}

struct WorkerState {
    id: usize,
    factory: Arc<dyn RuntimeFactory>,
    events: UnboundedSender<WorkerMessage>,
    runtime: Option<Box<dyn TranslationRuntime>>,
    source_language: String,
    pivoting: bool,
    queue: WorkQueue,
    terminated: bool,
}

impl WorkerState {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.events.send(WorkerMessage {
            worker: self.id,
            event,
        });
    }

    fn handle(&mut self, command: WorkerCommand) {
        match command {
            WorkerCommand::Init(request) => self.handle_init(request),
            WorkerCommand::Translate(request) => {
                let clean = clean_source_text(&request.source_text, &self.source_language);
                self.queue.push(QueuedTask { request, clean });
            }
            WorkerCommand::DiscardQueue => {
                let dropped = self.queue.cancel_all();
                if !dropped.is_empty() {
                    tracing::debug!(
                        worker = self.id,
                        count = dropped.len(),
                        "Discarded queued translations"
                    );
                }
                self.emit(WorkerEvent::Discarded);
            }
            WorkerCommand::CancelOne { translation_id } => {
                if let Some(task) = self.queue.cancel(translation_id) {
                    self.emit(WorkerEvent::TranslationError {
                        message_id: task.request.message_id,
                        error: TaskError::Cancelled,
                    });
                }
            }
            WorkerCommand::Terminate => {
                self.terminated = true;
            }
        }
    }

    fn handle_init(&mut self, request: InitRequest) {
        if self.runtime.is_some() {
            tracing::warn!(worker = self.id, "Duplicate init request ignored");
            return;
        }

        let pair = format!("{}_{}", request.source_language, request.target_language);
        match self.build_setup(request) {
            Ok(setup) => match self.factory.create(setup) {
                Ok(runtime) => {
                    self.runtime = Some(runtime);
                    tracing::info!(
                        worker = self.id,
                        pair = %pair,
                        pivoting = self.pivoting,
                        "Engine initialized"
                    );
                    self.emit(WorkerEvent::InitSuccess);
                }
                Err(e) => {
                    self.emit(WorkerEvent::InitError {
                        error: e.to_string(),
                    });
                    self.terminated = true;
                }
            },
            Err(error) => {
                self.emit(WorkerEvent::InitError { error });
                self.terminated = true;
            }
        }
    }

    /// Copy payloads into aligned memory and derive the per-model
    /// inference configuration.
    fn build_setup(&mut self, request: InitRequest) -> std::result::Result<EngineSetup, String> {
        if request.models.is_empty() || request.models.len() > 2 {
            return Err(format!(
                "engine requires 1 or 2 models, got {}",
                request.models.len()
            ));
        }

        self.source_language = request.source_language.clone();
        self.pivoting = request.models.len() == 2;

        let mut models = Vec::with_capacity(request.models.len());
        for payload in request.models {
            let model_name = payload
                .model_file_name()
                .ok_or_else(|| "model payload missing model binary".to_string())?
                .to_string();

            let shared = payload.contains(FileKind::Vocab);
            let split =
                payload.contains(FileKind::Srcvocab) && payload.contains(FileKind::Trgvocab);
            if !shared && !split {
                return Err(format!("model payload {model_name} missing vocabulary"));
            }

            let precision = GemmPrecision::for_model_file(&model_name);
            let has_quality_model = payload.contains(FileKind::QualityModel);
            let config_text = inference_config_text(precision, has_quality_model);

            let memory = payload
                .files
                .into_iter()
                .map(|file| ModelMemory {
                    data: AlignedBuf::from_slice(&file.bytes, file.kind.alignment()),
                    kind: file.kind,
                    name: file.name,
                })
                .collect();

            models.push(LoadedModel {
                config_text,
                precision,
                memory,
            });
        }

        Ok(EngineSetup {
            source_language: request.source_language,
            target_language: request.target_language,
            models,
            cache_size: request.cache_size,
        })
    }

    /// Drain queued tasks, yielding to command processing on budget.
    fn drain(&mut self, commands: &mut UnboundedReceiver<WorkerCommand>) {
        let mut budget = DrainBudget::start();

        while let Some(task) = self.queue.pop() {
            self.run_task(task);
            self.queue.mark_completed();
            budget.note_completed();

            // Cancellation must never wait behind the batch: poll the
            // command channel between every task.
            self.poll_commands(commands);
            if self.terminated {
                return;
            }

            if budget.exhausted() && !self.queue.bypass_batching() {
                std::thread::yield_now();
                self.poll_commands(commands);
                if self.terminated {
                    return;
                }
                budget = DrainBudget::start();
            }
        }
    }

    fn poll_commands(&mut self, commands: &mut UnboundedReceiver<WorkerCommand>) {
        while let Ok(command) = commands.try_recv() {
            self.handle(command);
            if self.terminated {
                return;
            }
        }
    }

    fn run_task(&mut self, task: QueuedTask) {
        let request = task.request;

        let Some(runtime) = self.runtime.as_mut() else {
            self.emit(WorkerEvent::TranslationError {
                message_id: request.message_id,
                error: TaskError::Runtime("worker not initialized".to_string()),
            });
            return;
        };

        let texts = vec![task.clean.cleaned.clone()];
        let started = Instant::now();
        let result = if self.pivoting {
            runtime.translate_pivot(&texts, request.is_html)
        } else {
            runtime.translate(&texts, request.is_html)
        };
        let inference_millis = started.elapsed().as_millis() as u64;

        match result {
            Ok(mut outputs) if !outputs.is_empty() => {
                let translated = outputs.remove(0);
                self.emit(WorkerEvent::Response(TranslationResponse {
                    message_id: request.message_id,
                    translation_id: request.translation_id,
                    target_text: task.clean.rewrap(&translated),
                    inference_millis,
                }));
            }
            Ok(_) => {
                self.emit(WorkerEvent::TranslationError {
                    message_id: request.message_id,
                    error: TaskError::Runtime("runtime returned no output".to_string()),
                });
            }
            Err(e) => {
                self.emit(WorkerEvent::TranslationError {
                    message_id: request.message_id,
                    error: TaskError::Runtime(e.to_string()),
                });
            }
        }
        // Per-call structures (message vector, outputs) drop here.
    }
}
