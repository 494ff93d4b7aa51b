//! Centralized constants for the translation service
//!
//! Single source of truth for infrastructure defaults. Endpoints can be
//! overridden through environment variables; everything else is fixed and
//! overridden, where meaningful, through [`crate::Settings`].

/// Remote endpoints (loaded from env vars with fallback defaults)
pub mod endpoints {
    use once_cell::sync::Lazy;

    /// Model catalog URL (env: ANUVAAD_CATALOG_URL)
    pub static CATALOG_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("ANUVAAD_CATALOG_URL")
            .unwrap_or_else(|_| "https://models.anuvaad.app/v1/models.json".to_string())
    });

    /// Base URL for model artifact downloads (env: ANUVAAD_ARTIFACTS_BASE_URL)
    pub static ARTIFACTS_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("ANUVAAD_ARTIFACTS_BASE_URL")
            .unwrap_or_else(|_| "https://models.anuvaad.app/v1/files/".to_string())
    });
}

/// HTTP client identity
pub mod http {
    /// User-Agent sent on catalog and artifact requests.
    pub const USER_AGENT: &str = concat!("anuvaad/", env!("CARGO_PKG_VERSION"));

    /// Accept-Encoding sent on catalog and artifact requests.
    pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";

    /// Per-request timeout for downloads (ms).
    pub const REQUEST_TIMEOUT_MS: u64 = 120_000;

    /// Download attempts per artifact before giving up.
    pub const DOWNLOAD_ATTEMPTS: u32 = 3;

    /// Fixed backoff between download attempts (ms).
    pub const DOWNLOAD_BACKOFF_MS: u64 = 1_000;
}

/// Engine cache defaults (overridable through Settings)
pub mod cache {
    /// Idle timeout before an engine pool is evicted (minutes).
    pub const IDLE_TIMEOUT_MIN: f64 = 30.0;

    /// Sweep interval for the idle-eviction task (ms).
    pub const MEMORY_CHECK_INTERVAL_MS: u64 = 60_000;

    /// Minimum interval between idle-deadline re-arms (ms).
    pub const TIMEOUT_RESET_THRESHOLD_MS: u64 = 300_000;
}

/// Worker defaults (overridable through Settings)
pub mod workers {
    /// Pool size per language pair.
    pub const WORKERS_PER_PAIR: usize = 1;

    /// Bound on pool construction, covering runtime load and model
    /// transfer (ms).
    pub const WORKER_INIT_TIMEOUT_MS: u64 = 600_000;
}

/// Language detection defaults
pub mod detection {
    /// Detection input is truncated to this many characters.
    pub const MAX_DETECTION_LENGTH: usize = 64;
}
