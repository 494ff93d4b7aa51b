//! On-disk model store
//!
//! Persisted layout under the data directory:
//! - `models.json` — the catalog
//! - `flags.json`  — `{ downloaded: [pair-key, ...] }` plus a refresh stamp
//! - `models/<file-name>` — artifacts, addressed by catalog name

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use anuvaad_config::Settings;
use anuvaad_core::LanguagePair;

use crate::bundle::{ModelBundle, ModelFile};
use crate::catalog::{Catalog, ModelRecord};
use crate::download::{sha256_hex, write_atomic, Downloader};
use crate::{ModelStoreError, Result};

const CATALOG_FILE: &str = "models.json";
const FLAGS_FILE: &str = "flags.json";
const MODELS_DIR: &str = "models";

/// Model store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub catalog_url: String,
    pub artifacts_base_url: String,
    pub offline: bool,
}

impl From<&Settings> for StoreConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            data_dir: settings.data_dir.clone(),
            catalog_url: settings.catalog_url.clone(),
            artifacts_base_url: settings.artifacts_base_url.clone(),
            offline: settings.offline,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// The `flags.json` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DownloadFlags {
    #[serde(default)]
    downloaded: BTreeSet<String>,
    #[serde(default)]
    refreshed_at: Option<DateTime<Utc>>,
}

/// Resolves language pairs to verified model bundles, downloading as
/// needed.
#[derive(Debug)]
pub struct ModelStore {
    config: StoreConfig,
    models_dir: PathBuf,
    downloader: Downloader,
    catalog: RwLock<Arc<Catalog>>,
    flags: Mutex<DownloadFlags>,
}

impl ModelStore {
    /// Ensure directories exist, load or fetch the catalog, and load the
    /// downloaded-flags document.
    pub async fn init(config: StoreConfig) -> Result<Self> {
        Self::init_with(config, false).await
    }

    /// Like [`init`](Self::init), but refetches the catalog even when a
    /// cached copy exists.
    pub async fn init_with(config: StoreConfig, force_update: bool) -> Result<Self> {
        let models_dir = config.data_dir.join(MODELS_DIR);
        tokio::fs::create_dir_all(&models_dir).await?;

        let downloader = Downloader::new(config.artifacts_base_url.clone(), config.offline)?;
        let catalog =
            Self::ensure_catalog(&config, &downloader, force_update).await?;
        let flags = Self::load_flags(&config.data_dir.join(FLAGS_FILE)).await;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            pairs = catalog.pair_keys().len(),
            offline = config.offline,
            "Model store initialized"
        );

        Ok(Self {
            config,
            models_dir,
            downloader,
            catalog: RwLock::new(Arc::new(catalog)),
            flags: Mutex::new(flags),
        })
    }

    /// The current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    /// Force a catalog refetch and swap in the new snapshot.
    pub async fn refresh_catalog(&self) -> Result<()> {
        let catalog = Self::ensure_catalog(&self.config, &self.downloader, true).await?;
        *self.catalog.write() = Arc::new(catalog);

        let mut flags = self.flags.lock().await;
        flags.refreshed_at = Some(Utc::now());
        self.save_flags(&flags).await?;
        Ok(())
    }

    /// Refresh policy: use the cached file unless it is missing or a
    /// refresh is forced; fall back to the cached copy when a refetch
    /// fails.
    async fn ensure_catalog(
        config: &StoreConfig,
        downloader: &Downloader,
        force_update: bool,
    ) -> Result<Catalog> {
        let path = config.data_dir.join(CATALOG_FILE);

        if !force_update {
            if let Some(catalog) = Self::read_cached_catalog(&path).await {
                return Ok(catalog);
            }
        }

        match downloader.fetch_text(&config.catalog_url).await {
            Ok(text) => {
                let catalog = Catalog::parse(&text)?;
                write_atomic(&path, text.as_bytes()).await?;
                tracing::info!(url = %config.catalog_url, "Catalog refreshed");
                Ok(catalog)
            }
            Err(fetch_error) => {
                if let Some(catalog) = Self::read_cached_catalog(&path).await {
                    tracing::warn!(
                        error = %fetch_error,
                        "Catalog refetch failed, using cached copy"
                    );
                    return Ok(catalog);
                }
                Err(ModelStoreError::CatalogUnavailable(format!(
                    "not cached and refetch failed: {fetch_error}"
                )))
            }
        }
    }

    async fn read_cached_catalog(path: &Path) -> Option<Catalog> {
        let text = tokio::fs::read_to_string(path).await.ok()?;
        match Catalog::parse(&text) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cached catalog unreadable");
                None
            }
        }
    }

    /// Resolve a pair to a verified bundle, downloading missing or
    /// corrupt artifacts first.
    pub async fn get_model(&self, pair: &LanguagePair) -> Result<ModelBundle> {
        let catalog = self.catalog();
        let records: Vec<ModelRecord> = catalog
            .records_for(pair)
            .into_iter()
            .cloned()
            .collect();

        if records.is_empty() {
            return Err(ModelStoreError::NoSuchPair(pair.key()));
        }

        for record in &records {
            self.ensure_artifact(record).await?;
        }

        let mut bundle = ModelBundle::new(pair.clone());
        for record in &records {
            let path = self.models_dir.join(&record.name);
            let bytes = tokio::fs::read(&path).await?;

            // Verify again at assembly so a corrupt disk never reaches an
            // engine.
            let actual = sha256_hex(&bytes);
            if actual != record.attachment.hash {
                return Err(ModelStoreError::ChecksumMismatch {
                    name: record.name.clone(),
                    expected: record.attachment.hash.clone(),
                    actual,
                });
            }

            bundle.insert(ModelFile {
                kind: record.file_type,
                name: record.name.clone(),
                bytes,
            });
        }

        bundle.validate()?;
        self.mark_downloaded(pair).await?;

        tracing::debug!(pair = %pair.key(), files = records.len(), "Model bundle assembled");
        Ok(bundle)
    }

    /// Pair keys recorded as fully downloaded.
    pub async fn list_downloaded(&self) -> BTreeSet<String> {
        self.flags.lock().await.downloaded.clone()
    }

    /// Make sure one artifact exists locally with the expected checksum.
    async fn ensure_artifact(&self, record: &ModelRecord) -> Result<()> {
        let path = self.models_dir.join(&record.name);

        match tokio::fs::read(&path).await {
            Ok(bytes) if sha256_hex(&bytes) == record.attachment.hash => return Ok(()),
            Ok(_) => {
                tracing::warn!(name = %record.name, "Local artifact corrupt, re-downloading");
                tokio::fs::remove_file(&path).await?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.downloader.fetch_artifact(record, &path).await
    }

    async fn mark_downloaded(&self, pair: &LanguagePair) -> Result<()> {
        let mut flags = self.flags.lock().await;
        if flags.downloaded.insert(pair.key()) {
            self.save_flags(&flags).await?;
        }
        Ok(())
    }

    async fn load_flags(path: &Path) -> DownloadFlags {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Flags document unreadable, starting fresh");
                DownloadFlags::default()
            }),
            Err(_) => DownloadFlags::default(),
        }
    }

    async fn save_flags(&self, flags: &DownloadFlags) -> Result<()> {
        let path = self.config.data_dir.join(FLAGS_FILE);
        let json = serde_json::to_vec_pretty(flags)?;
        write_atomic(&path, &json).await
    }
}
