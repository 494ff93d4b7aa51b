//! Shared harness for translation service integration tests: a seeded
//! offline model store, a deterministic tagging runtime, and a scheme
//! converter that records its calls.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anuvaad_config::Settings;
use anuvaad_core::{
    EngineSetup, HanConversion, RuntimeError, RuntimeFactory, ScriptConverter, ScriptError,
    TranslationRuntime,
};
use anuvaad_models::{sha256_hex, ModelStore, StoreConfig};
use anuvaad_translator::Translator;

/// Self-cleaning temp directory for a test's model store.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "anuvaad-translator-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(path.join("models")).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Write a catalog plus matching artifact files for the given pairs.
pub fn seed_catalog(dir: &Path, pairs: &[(&str, &str)]) {
    let mut records = Vec::new();
    for (from, to) in pairs {
        let model_bytes = format!("model-{from}-{to}").into_bytes();
        let vocab_bytes = format!("vocab-{from}-{to}").into_bytes();
        let model_name = format!("model.{from}-{to}.intgemm8.bin");
        let vocab_name = format!("vocab.{from}-{to}.spm");

        std::fs::write(dir.join("models").join(&model_name), &model_bytes).unwrap();
        std::fs::write(dir.join("models").join(&vocab_name), &vocab_bytes).unwrap();

        records.push(serde_json::json!({
            "fromLang": from, "toLang": to, "fileType": "model",
            "name": model_name, "size": model_bytes.len(),
            "attachment": {
                "location": format!("{from}-{to}/{model_name}"),
                "hash": sha256_hex(&model_bytes),
            }
        }));
        records.push(serde_json::json!({
            "fromLang": from, "toLang": to, "fileType": "vocab",
            "name": vocab_name,
            "attachment": {
                "location": format!("{from}-{to}/{vocab_name}"),
                "hash": sha256_hex(&vocab_bytes),
            }
        }));
    }
    std::fs::write(
        dir.join("models.json"),
        serde_json::Value::Array(records).to_string(),
    )
    .unwrap();
}

/// What a runtime does with each text, beyond tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeBehavior {
    /// Tag texts with the engine's pair.
    Tag,
    /// Sleep before tagging, to keep requests in flight.
    Slow,
    /// Fail every inference call.
    FailTranslations,
    /// Panic inside the inference call.
    Panic,
}

pub struct TaggingRuntime {
    source: String,
    target: String,
    behavior: RuntimeBehavior,
    calls: Arc<AtomicUsize>,
}

impl TaggingRuntime {
    fn run(&self, texts: &[String], pivot: bool) -> Result<Vec<String>, RuntimeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            RuntimeBehavior::Slow => std::thread::sleep(Duration::from_millis(300)),
            RuntimeBehavior::FailTranslations => {
                return Err(RuntimeError::Inference("injected inference failure".into()))
            }
            RuntimeBehavior::Panic => panic!("injected runtime panic"),
            RuntimeBehavior::Tag => {}
        }
        let infix = if pivot {
            format!("{}-en-{}", self.source, self.target)
        } else {
            format!("{}-{}", self.source, self.target)
        };
        Ok(texts.iter().map(|t| format!("[{infix}] {t}")).collect())
    }
}

impl TranslationRuntime for TaggingRuntime {
    fn translate(&mut self, texts: &[String], _html: bool) -> Result<Vec<String>, RuntimeError> {
        self.run(texts, false)
    }

    fn translate_pivot(
        &mut self,
        texts: &[String],
        _html: bool,
    ) -> Result<Vec<String>, RuntimeError> {
        self.run(texts, true)
    }
}

pub struct TaggingFactory {
    pub behavior: RuntimeBehavior,
    pub created: Arc<AtomicUsize>,
    pub calls: Arc<AtomicUsize>,
}

impl TaggingFactory {
    pub fn new(behavior: RuntimeBehavior) -> Self {
        Self {
            behavior,
            created: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl RuntimeFactory for TaggingFactory {
    fn create(&self, setup: EngineSetup) -> Result<Box<dyn TranslationRuntime>, RuntimeError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TaggingRuntime {
            source: setup.source_language,
            target: setup.target_language,
            behavior: self.behavior,
            calls: self.calls.clone(),
        }))
    }

    fn name(&self) -> &str {
        "tagging-runtime"
    }
}

/// Converter that wraps text in its scheme name, e.g. `s2t(text)`.
pub struct SchemeConverter {
    pub calls: Arc<AtomicUsize>,
}

impl SchemeConverter {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ScriptConverter for SchemeConverter {
    fn convert(&self, conversion: HanConversion, text: &str) -> Result<String, ScriptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}({})", conversion.scheme(), text))
    }

    fn name(&self) -> &str {
        "scheme-converter"
    }
}

/// A fully wired service over a seeded offline store, plus the counters
/// the tests assert on.
pub struct TestService {
    pub translator: Translator,
    pub engines_created: Arc<AtomicUsize>,
    pub runtime_calls: Arc<AtomicUsize>,
    pub convert_calls: Arc<AtomicUsize>,
    _dir: TempDir,
}

pub async fn service(pairs: &[(&str, &str)]) -> TestService {
    service_with(pairs, RuntimeBehavior::Tag, |_| {}).await
}

pub async fn service_with(
    pairs: &[(&str, &str)],
    behavior: RuntimeBehavior,
    tune: impl FnOnce(&mut Settings),
) -> TestService {
    let dir = TempDir::new();
    seed_catalog(dir.path(), pairs);

    let mut settings = Settings::default();
    settings.offline = true;
    settings.data_dir = dir.path().to_path_buf();
    settings.worker_init_timeout_ms = 5_000;
    tune(&mut settings);

    let store = Arc::new(
        ModelStore::init(StoreConfig::from(&settings))
            .await
            .expect("model store init"),
    );

    let factory = Arc::new(TaggingFactory::new(behavior));
    let engines_created = factory.created.clone();
    let runtime_calls = factory.calls.clone();

    let converter = Arc::new(SchemeConverter::new());
    let convert_calls = converter.calls.clone();

    TestService {
        translator: Translator::new(settings, store, factory, converter),
        engines_created,
        runtime_calls,
        convert_calls,
        _dir: dir,
    }
}
