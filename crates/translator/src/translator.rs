//! Translator coordinator
//!
//! Single entry point for callers: normalizes languages, detects the
//! source when asked, plans script conversion and direct-vs-pivot
//! translation, dispatches to engine pools round-robin, and reassembles
//! results in input order. The coordinator never performs inference
//! itself.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use uuid::Uuid;

use anuvaad_config::Settings;
use anuvaad_core::language::{canonicalize, HanConversion, LanguagePair, ALIASES, AUTO, HAN_VARIANTS, SIMPLIFIED_CHINESE};
use anuvaad_core::{RuntimeFactory, ScriptConverter};
use anuvaad_engine::{
    EngineError, EnginePool, ModelPayload, PayloadFile, TaskError, TranslationRequest,
    TranslationResponse, WorkerEvent, WorkerMessage,
};
use anuvaad_models::{ModelBundle, ModelStore};

use crate::cache::{CacheConfig, CacheEntry, EngineCache, EntryStats};
use crate::detect::LanguageDetector;
use crate::pending::{PendingMap, PendingTranslation};
use crate::plan::{self, Plan};
use crate::texts::Texts;
use crate::{Result, TranslatorError};

/// Service-wide stats snapshot.
#[derive(Debug, Clone)]
pub struct TranslatorStats {
    pub pools: Vec<EntryStats>,
    pub pending: usize,
}

struct Inner {
    settings: Settings,
    store: Arc<ModelStore>,
    factory: Arc<dyn RuntimeFactory>,
    converter: Arc<dyn ScriptConverter>,
    detector: LanguageDetector,
    cache: Arc<EngineCache>,
    pending: Arc<PendingMap>,
    next_message_id: AtomicU64,
    shut_down: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Best-effort teardown when the last handle goes away without an
        // explicit shutdown.
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            self.pending.reject_all(|| TranslatorError::Shutdown);
            self.cache.clear();
        }
    }
}

/// The translation service coordinator.
#[derive(Clone)]
pub struct Translator {
    inner: Arc<Inner>,
}

impl Translator {
    pub fn new(
        settings: Settings,
        store: Arc<ModelStore>,
        factory: Arc<dyn RuntimeFactory>,
        converter: Arc<dyn ScriptConverter>,
    ) -> Self {
        let cache = EngineCache::new(CacheConfig::from(&settings));
        tracing::info!(
            runtime = factory.name(),
            converter = converter.name(),
            workers_per_pair = settings.workers_per_pair,
            "Translator created"
        );
        Self {
            inner: Arc::new(Inner {
                settings,
                store,
                factory,
                converter,
                detector: LanguageDetector::new(),
                cache,
                pending: Arc::new(PendingMap::default()),
                next_message_id: AtomicU64::new(1),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Every tag the service accepts, aliases included.
    pub fn supported_languages(&self) -> Vec<String> {
        self.supported_set().into_iter().collect()
    }

    fn supported_set(&self) -> BTreeSet<String> {
        let mut set = self.inner.store.catalog().languages();
        // Han-script routing works with or without Chinese models.
        set.insert(SIMPLIFIED_CHINESE.to_string());
        for variant in HAN_VARIANTS {
            set.insert(variant.to_string());
        }
        for (alias, target) in ALIASES {
            if set.contains(*target) {
                set.insert(alias.to_string());
            }
        }
        set
    }

    fn is_supported(&self, tag: &str) -> bool {
        self.supported_set().contains(tag)
    }

    /// Detect the language of a short text; `"en"` when uncertain.
    pub fn detect(&self, text: &str) -> String {
        let truncated: String = text
            .chars()
            .take(self.inner.settings.max_detection_length)
            .collect();
        self.inner.detector.detect(&truncated)
    }

    /// Translate a text or list of texts. Output shape matches the input.
    pub async fn translate(
        &self,
        input: impl Into<Texts>,
        from: &str,
        to: &str,
    ) -> Result<Texts> {
        self.translate_with(input, from, to, false).await
    }

    /// Translate with explicit HTML handling.
    pub async fn translate_with(
        &self,
        input: impl Into<Texts>,
        from: &str,
        to: &str,
        is_html: bool,
    ) -> Result<Texts> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(TranslatorError::Shutdown);
        }

        let (texts, shape) = input.into().into_parts();

        let from = if from == AUTO {
            let sample = texts.first().map(String::as_str).unwrap_or("");
            let detected = self.detect(sample);
            tracing::debug!(detected = %detected, "Source language detected");
            detected
        } else {
            from.to_string()
        };

        if !self.is_supported(&from) {
            return Err(TranslatorError::InvalidLanguage(from));
        }
        if !self.is_supported(to) {
            return Err(TranslatorError::InvalidLanguage(to.to_string()));
        }

        let from = canonicalize(&from).to_string();
        let to = canonicalize(to).to_string();

        if from == to {
            return Ok(Texts::from_parts(texts, shape));
        }

        let catalog = self.inner.store.catalog();
        let plan = plan::compute(&from, &to, |pair| catalog.has_pair(pair));

        let outputs = match plan {
            Plan::Identity => texts,
            Plan::Script { steps } => self.convert_texts(&texts, &steps)?,
            Plan::Neural {
                pair,
                pre,
                post,
                pivot,
            } => {
                self.translate_neural(texts, &pair, pre, post, pivot, is_html)
                    .await?
            }
        };

        Ok(Texts::from_parts(outputs, shape))
    }

    /// Build (or fetch) the pool for a pair ahead of time. The handle
    /// translates with the pair fixed.
    pub async fn preload(&self, from: &str, to: &str) -> Result<TranslationHandle> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(TranslatorError::Shutdown);
        }

        if !self.is_supported(from) {
            return Err(TranslatorError::InvalidLanguage(from.to_string()));
        }
        if !self.is_supported(to) {
            return Err(TranslatorError::InvalidLanguage(to.to_string()));
        }

        let canonical_from = canonicalize(from).to_string();
        let canonical_to = canonicalize(to).to_string();

        if canonical_from != canonical_to {
            let catalog = self.inner.store.catalog();
            if let Plan::Neural { pair, pivot, .. } =
                plan::compute(&canonical_from, &canonical_to, |pair| catalog.has_pair(pair))
            {
                self.entry_for(&pair, pivot).await?;
            }
        }

        Ok(TranslationHandle {
            translator: self.clone(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Void every queued and in-flight translation for a pair.
    pub async fn discard_translations(&self, from: &str, to: &str) -> Result<()> {
        if !self.is_supported(from) {
            return Err(TranslatorError::InvalidLanguage(from.to_string()));
        }
        if !self.is_supported(to) {
            return Err(TranslatorError::InvalidLanguage(to.to_string()));
        }

        let from = canonicalize(from).to_string();
        let to = canonicalize(to).to_string();
        if from == to {
            return Ok(());
        }

        let catalog = self.inner.store.catalog();
        let Plan::Neural { pair, .. } = plan::compute(&from, &to, |pair| catalog.has_pair(pair))
        else {
            return Ok(());
        };

        let key = pair.key();
        if let Some(entry) = self.inner.cache.get(&key) {
            entry.pool().discard();
        }
        self.inner
            .pending
            .reject_pair(&key, || TranslatorError::Engine(EngineError::Discarded));
        tracing::info!(pair = %key, "Translations discarded");
        Ok(())
    }

    /// Tear the service down: reject every pending message, terminate
    /// every pool, stop the sweeper. Idempotent, never fails.
    pub async fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.pending.reject_all(|| TranslatorError::Shutdown);
        self.inner.cache.clear();
        tracing::info!("Translator shut down");
    }

    pub fn stats(&self) -> TranslatorStats {
        TranslatorStats {
            pools: self.inner.cache.stats(),
            pending: self.inner.pending.len(),
        }
    }

    fn convert_texts(&self, texts: &[String], steps: &[HanConversion]) -> Result<Vec<String>> {
        texts
            .iter()
            .map(|text| {
                if text.trim().is_empty() {
                    return Ok(String::new());
                }
                let mut current = text.clone();
                for step in steps {
                    current = self.inner.converter.convert(*step, &current)?;
                }
                Ok(current)
            })
            .collect()
    }

    async fn translate_neural(
        &self,
        texts: Vec<String>,
        pair: &LanguagePair,
        pre: Option<HanConversion>,
        post: Option<HanConversion>,
        pivot: bool,
        is_html: bool,
    ) -> Result<Vec<String>> {
        let entry = self.entry_for(pair, pivot).await?;
        entry.record_use();

        let key = pair.key();
        type Completion = oneshot::Receiver<std::result::Result<TranslationResponse, TranslatorError>>;
        let mut receivers: Vec<Option<Completion>> = Vec::with_capacity(texts.len());

        for text in &texts {
            // Blank texts bypass the engine entirely.
            if text.trim().is_empty() {
                receivers.push(None);
                continue;
            }

            let source_text = match pre {
                Some(step) => self.inner.converter.convert(step, text)?,
                None => text.clone(),
            };

            let message_id = self.inner.next_message_id.fetch_add(1, Ordering::SeqCst);
            let translation_id = Uuid::new_v4();
            let (tx, rx) = oneshot::channel();
            self.inner.pending.insert(
                message_id,
                PendingTranslation {
                    translation_id,
                    pair_key: key.clone(),
                    tx,
                },
            );

            if let Err(e) = entry.pool().submit(TranslationRequest {
                message_id,
                translation_id,
                source_text,
                is_html,
            }) {
                self.inner.pending.remove(message_id);
                return Err(e.into());
            }

            receivers.push(Some(rx));
        }

        let mut outputs = Vec::with_capacity(texts.len());
        for receiver in receivers {
            match receiver {
                None => outputs.push(String::new()),
                Some(rx) => {
                    let response = rx.await.map_err(|_| TranslatorError::Shutdown)??;
                    outputs.push(response.target_text);
                }
            }
        }

        self.inner.cache.keep_alive(&key);

        if let Some(step) = post {
            outputs = outputs
                .into_iter()
                .map(|text| {
                    if text.is_empty() {
                        Ok(text)
                    } else {
                        Ok(self.inner.converter.convert(step, &text)?)
                    }
                })
                .collect::<Result<Vec<String>>>()?;
        }

        Ok(outputs)
    }

    /// Cached entry for a pair, building its pool on first use. Builds
    /// are single-flight per pair.
    async fn entry_for(&self, pair: &LanguagePair, pivot: bool) -> Result<Arc<CacheEntry>> {
        let inner = Arc::clone(&self.inner);
        let pair = pair.clone();
        let key = pair.key();

        self.inner
            .cache
            .get_or_create(&key, move || {
                Box::pin(async move {
                    let models = if pivot {
                        let (first, second) = pair.pivot_legs();
                        vec![
                            payload_from(inner.store.get_model(&first).await?),
                            payload_from(inner.store.get_model(&second).await?),
                        ]
                    } else {
                        vec![payload_from(inner.store.get_model(&pair).await?)]
                    };

                    let (pool, events) = EnginePool::build(
                        pair.clone(),
                        models,
                        inner.factory.clone(),
                        inner.settings.workers_per_pair,
                        inner.settings.worker_init_timeout(),
                        0,
                    )
                    .await?;

                    let entry = Arc::new(CacheEntry::new(pair.clone(), pool));
                    tokio::spawn(route_events(
                        events,
                        inner.pending.clone(),
                        Arc::downgrade(&inner.cache),
                        pair.key(),
                    ));
                    Ok(entry)
                })
            })
            .await
    }
}

/// Pair-bound handle returned by [`Translator::preload`].
pub struct TranslationHandle {
    translator: Translator,
    from: String,
    to: String,
}

impl TranslationHandle {
    pub async fn translate(&self, input: impl Into<Texts>) -> Result<Texts> {
        self.translator
            .translate_with(input, &self.from, &self.to, false)
            .await
    }

    pub async fn translate_html(&self, input: impl Into<Texts>) -> Result<Texts> {
        self.translator
            .translate_with(input, &self.from, &self.to, true)
            .await
    }

    pub async fn discard_translations(&self) -> Result<()> {
        self.translator
            .discard_translations(&self.from, &self.to)
            .await
    }

    pub fn pair(&self) -> (&str, &str) {
        (&self.from, &self.to)
    }
}

fn payload_from(bundle: ModelBundle) -> ModelPayload {
    ModelPayload {
        files: bundle
            .into_files()
            .into_iter()
            .map(|file| PayloadFile {
                kind: file.kind,
                name: file.name,
                bytes: file.bytes,
            })
            .collect(),
    }
}

/// Per-pool event router: resolves completions against the pending map
/// and turns worker faults into pool eviction.
async fn route_events(
    mut events: UnboundedReceiver<WorkerMessage>,
    pending: Arc<PendingMap>,
    cache: Weak<EngineCache>,
    pair_key: String,
) {
    while let Some(message) = events.recv().await {
        match message.event {
            WorkerEvent::Response(response) => pending.resolve(response),
            WorkerEvent::TranslationError { message_id, error } => {
                let error = match error {
                    TaskError::Cancelled => TranslatorError::Engine(EngineError::Cancelled),
                    TaskError::Runtime(message) => {
                        TranslatorError::Engine(EngineError::Translation(message))
                    }
                };
                pending.reject(message_id, error);
            }
            WorkerEvent::Fatal { error } => {
                tracing::error!(
                    pair = %pair_key,
                    worker = message.worker,
                    error = %error,
                    "Worker fault, evicting engine pool"
                );
                if let Some(cache) = cache.upgrade() {
                    cache.remove(&pair_key);
                }
                pending.reject_pair(&pair_key, || {
                    TranslatorError::Engine(EngineError::WorkerLost(error.clone()))
                });
            }
            WorkerEvent::Discarded => {
                tracing::debug!(pair = %pair_key, worker = message.worker, "Worker queue discarded");
            }
            other => {
                tracing::warn!(pair = %pair_key, event = ?other, "Unexpected worker event");
            }
        }
    }

    // Every worker is gone (termination or eviction); fail any stragglers
    // for this pair.
    pending.reject_pair(&pair_key, || TranslatorError::Shutdown);
}
