//! Model catalog
//!
//! The catalog is a JSON array of records, one per artifact file. Wire
//! field names are camelCase (`fromLang`, `fileType`, `attachment`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use anuvaad_core::{FileKind, LanguagePair};

use crate::{ModelStoreError, Result};

/// Remote location and expected digest of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Location relative to the artifacts base URL, or an absolute URL.
    pub location: String,
    /// Expected SHA-256 of the full file, lowercase hex.
    pub hash: String,
}

/// One artifact entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub from_lang: String,
    pub to_lang: String,
    pub file_type: FileKind,
    /// Artifact file name; local artifacts are addressed by this name.
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub attachment: Attachment,
}

impl ModelRecord {
    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(self.from_lang.clone(), self.to_lang.clone())
    }
}

/// Parsed catalog with pair lookups.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ModelRecord>,
}

impl Catalog {
    pub fn parse(json: &str) -> Result<Self> {
        let records: Vec<ModelRecord> = serde_json::from_str(json)
            .map_err(|e| ModelStoreError::CatalogUnavailable(format!("malformed catalog: {e}")))?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    /// All records belonging to one language pair.
    pub fn records_for(&self, pair: &LanguagePair) -> Vec<&ModelRecord> {
        self.records
            .iter()
            .filter(|r| r.from_lang == pair.from && r.to_lang == pair.to)
            .collect()
    }

    /// Whether the pair is modeled as a single hop.
    pub fn has_pair(&self, pair: &LanguagePair) -> bool {
        self.records
            .iter()
            .any(|r| r.from_lang == pair.from && r.to_lang == pair.to)
    }

    /// Every pair key present in the catalog.
    pub fn pair_keys(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.pair().key()).collect()
    }

    /// Every language tag reachable through at least one model.
    pub fn languages(&self) -> BTreeSet<String> {
        let mut languages = BTreeSet::new();
        for record in &self.records {
            languages.insert(record.from_lang.clone());
            languages.insert(record.to_lang.clone());
        }
        languages
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
