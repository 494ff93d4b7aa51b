//! Artifact downloads
//!
//! Files are fetched with a fixed client identity and verified by SHA-256
//! before use. Failed verification deletes the corrupt file and retries
//! with a fixed backoff; attempts are bounded.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

use anuvaad_config::constants::http;

use crate::catalog::ModelRecord;
use crate::{ModelStoreError, Result};

/// Lowercase hex SHA-256 of a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// HTTP fetcher for the catalog and model artifacts.
#[derive(Debug)]
pub struct Downloader {
    client: reqwest::Client,
    base_url: String,
    offline: bool,
    max_attempts: u32,
    backoff: Duration,
}

impl Downloader {
    pub fn new(base_url: impl Into<String>, offline: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(http::USER_AGENT));
        headers.insert(
            ACCEPT_ENCODING,
            HeaderValue::from_static(http::ACCEPT_ENCODING),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(http::REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|e| ModelStoreError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            offline,
            max_attempts: http::DOWNLOAD_ATTEMPTS,
            backoff: Duration::from_millis(http::DOWNLOAD_BACKOFF_MS),
        })
    }

    /// Resolve an attachment location against the artifacts base URL.
    fn resolve_url(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            let base = self.base_url.trim_end_matches('/');
            format!("{base}/{location}")
        }
    }

    /// Fetch a text document (the catalog) in one shot, no verification.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        if self.offline {
            return Err(ModelStoreError::Offline(format!(
                "cannot fetch {url} in offline mode"
            )));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ModelStoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelStoreError::Http(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ModelStoreError::Http(e.to_string()))
    }

    /// Download one artifact to `dest`, verifying its checksum.
    ///
    /// On mismatch the corrupt file is deleted and the download retried;
    /// the final failure surfaces as `ChecksumMismatch`.
    pub async fn fetch_artifact(&self, record: &ModelRecord, dest: &Path) -> Result<()> {
        if self.offline {
            return Err(ModelStoreError::Offline(format!(
                "model artifact {} requires a download",
                record.name
            )));
        }

        let url = self.resolve_url(&record.attachment.location);
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff).await;
            }

            match self.fetch_once(&url, record, dest).await {
                Ok(()) => {
                    tracing::info!(
                        name = %record.name,
                        size = record.size,
                        attempt,
                        "Model artifact downloaded"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        name = %record.name,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Artifact download failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ModelStoreError::Http(format!("download of {} failed", record.name))
        }))
    }

    async fn fetch_once(&self, url: &str, record: &ModelRecord, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ModelStoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelStoreError::Http(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ModelStoreError::Http(e.to_string()))?;

        let actual = sha256_hex(&bytes);
        if actual != record.attachment.hash {
            return Err(ModelStoreError::ChecksumMismatch {
                name: record.name.clone(),
                expected: record.attachment.hash.clone(),
                actual,
            });
        }

        write_atomic(dest, &bytes).await?;
        Ok(())
    }
}

/// Write through a temp file and rename, so a partially written artifact
/// is never observed at its final path.
pub(crate) async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = dest.with_extension("part");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, dest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        // Known digest of the empty input.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_resolve_url() {
        let downloader = Downloader::new("https://models.example/v1/files/", false).unwrap();
        assert_eq!(
            downloader.resolve_url("en-de/model.bin"),
            "https://models.example/v1/files/en-de/model.bin"
        );
        assert_eq!(
            downloader.resolve_url("https://cdn.example/model.bin"),
            "https://cdn.example/model.bin"
        );
    }

    #[tokio::test]
    async fn test_offline_fetch_fails() {
        let downloader = Downloader::new("https://models.example/", true).unwrap();
        let err = downloader
            .fetch_text("https://models.example/models.json")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelStoreError::Offline(_)));
    }
}
