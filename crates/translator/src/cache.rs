//! Engine cache
//!
//! Maps pair keys to resident engine pools. Entries stay alive while they
//! are used; a periodic sweeper evicts pools idle past the timeout.
//! Construction is single-flight per pair: concurrent requests for the
//! same new pair produce exactly one pool.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use anuvaad_config::Settings;
use anuvaad_core::LanguagePair;
use anuvaad_engine::EnginePool;

use crate::Result;

/// Cache behavior knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `None` disables idle eviction entirely: no sweeper, no deadlines.
    pub idle_timeout: Option<Duration>,
    pub check_interval: Duration,
    pub reset_threshold: Duration,
}

impl From<&Settings> for CacheConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            idle_timeout: settings.idle_timeout(),
            check_interval: settings.memory_check_interval(),
            reset_threshold: settings.timeout_reset_threshold(),
        }
    }
}

/// Stats snapshot for one cache entry.
#[derive(Debug, Clone)]
pub struct EntryStats {
    pub pair: String,
    pub workers: usize,
    pub pivoting: bool,
    pub use_count: u64,
    pub idle: Duration,
}

/// One resident engine pool with its idle bookkeeping.
pub struct CacheEntry {
    pair: LanguagePair,
    pool: EnginePool,
    last_used: RwLock<Instant>,
    armed_at: Mutex<Option<Instant>>,
    use_count: AtomicU64,
}

impl CacheEntry {
    pub fn new(pair: LanguagePair, pool: EnginePool) -> Self {
        Self {
            pair,
            pool,
            last_used: RwLock::new(Instant::now()),
            armed_at: Mutex::new(None),
            use_count: AtomicU64::new(0),
        }
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn pool(&self) -> &EnginePool {
        &self.pool
    }

    pub fn use_count(&self) -> u64 {
        self.use_count.load(Ordering::Relaxed)
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.read().elapsed()
    }

    pub(crate) fn record_use(&self) {
        self.use_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Bump `last_used`; re-arm the idle deadline only if the last re-arm
    /// is older than the reset threshold, to avoid timer churn under
    /// sustained load.
    pub(crate) fn keep_alive(&self, reset_threshold: Duration, eviction_enabled: bool) {
        *self.last_used.write() = Instant::now();

        if !eviction_enabled {
            return;
        }

        let mut armed = self.armed_at.lock();
        let rearm = match *armed {
            None => true,
            Some(at) => at.elapsed() >= reset_threshold,
        };
        if rearm {
            *armed = Some(Instant::now());
            tracing::trace!(pair = %self.pair.key(), "Idle deadline re-armed");
        }
    }

    pub fn stats(&self) -> EntryStats {
        EntryStats {
            pair: self.pair.key(),
            workers: self.pool.size(),
            pivoting: self.pool.is_pivoting(),
            use_count: self.use_count(),
            idle: self.idle_for(),
        }
    }
}

type BuildFuture = Pin<Box<dyn Future<Output = Result<Arc<CacheEntry>>> + Send>>;

/// Pair-keyed cache of engine pools.
pub struct EngineCache {
    config: CacheConfig,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    builds: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    sweeper: Mutex<Option<watch::Sender<bool>>>,
    /// Self-reference handed to the sweeper task so it never keeps the
    /// cache alive on its own.
    weak_self: Weak<EngineCache>,
}

impl EngineCache {
    pub fn new(config: CacheConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            config,
            entries: RwLock::new(HashMap::new()),
            builds: tokio::sync::Mutex::new(HashMap::new()),
            sweeper: Mutex::new(None),
            weak_self: weak.clone(),
        })
    }

    fn eviction_enabled(&self) -> bool {
        self.config.idle_timeout.is_some()
    }

    /// Existing entry for the pair, refreshing its idle deadline.
    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let entry = self.entries.read().get(key).cloned();
        if let Some(entry) = &entry {
            entry.keep_alive(self.config.reset_threshold, self.eviction_enabled());
        }
        entry
    }

    /// Bump a pair's last-used time without retrieving it.
    pub fn keep_alive(&self, key: &str) {
        if let Some(entry) = self.entries.read().get(key) {
            entry.keep_alive(self.config.reset_threshold, self.eviction_enabled());
        }
    }

    /// Existing entry, or build one. Builds for the same pair are
    /// serialized so at most one runs concurrently; builds for different
    /// pairs proceed in parallel.
    pub async fn get_or_create(
        &self,
        key: &str,
        build: impl FnOnce() -> BuildFuture,
    ) -> Result<Arc<CacheEntry>> {
        if let Some(entry) = self.get(key) {
            return Ok(entry);
        }

        let build_lock = {
            let mut builds = self.builds.lock().await;
            builds.entry(key.to_string()).or_default().clone()
        };
        let _guard = build_lock.lock().await;

        // A concurrent builder may have finished while we waited.
        if let Some(entry) = self.get(key) {
            return Ok(entry);
        }

        let result = build().await;
        self.builds.lock().await.remove(key);

        let entry = result?;
        entry.keep_alive(self.config.reset_threshold, self.eviction_enabled());

        let first = {
            let mut entries = self.entries.write();
            let first = entries.is_empty();
            entries.insert(key.to_string(), entry.clone());
            first
        };
        if first {
            self.start_sweeper();
        }

        Ok(entry)
    }

    /// Terminate a pair's workers and drop its entry. Stops the sweeper
    /// when the map empties.
    pub fn remove(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let (entry, now_empty) = {
            let mut entries = self.entries.write();
            let entry = entries.remove(key);
            (entry, entries.is_empty())
        };

        let entry = entry?;
        entry.pool().terminate();
        if now_empty {
            self.stop_sweeper();
        }
        tracing::info!(pair = %key, "Engine pool removed");
        Some(entry)
    }

    /// Terminate everything and stop the sweeper. Never fails.
    pub fn clear(&self) {
        self.stop_sweeper();
        let drained: Vec<(String, Arc<CacheEntry>)> = {
            let mut entries = self.entries.write();
            entries.drain().collect()
        };
        for (key, entry) in drained {
            entry.pool().terminate();
            tracing::debug!(pair = %key, "Engine pool terminated");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> Vec<EntryStats> {
        self.entries.read().values().map(|e| e.stats()).collect()
    }

    fn start_sweeper(&self) {
        let Some(idle_timeout) = self.config.idle_timeout else {
            return;
        };

        let mut guard = self.sweeper.lock();
        if guard.is_some() {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        *guard = Some(tx);
        drop(guard);

        let check_interval = self.config.check_interval;
        let cache = self.weak_self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval fires immediately; skip the zeroth tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        cache.sweep(idle_timeout);
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            tracing::debug!("Engine cache sweeper stopped");
                            break;
                        }
                    }
                }
            }
        });

        tracing::debug!(
            interval_ms = check_interval.as_millis() as u64,
            "Engine cache sweeper started"
        );
    }

    fn stop_sweeper(&self) {
        if let Some(tx) = self.sweeper.lock().take() {
            let _ = tx.send(true);
        }
    }

    fn sweep(&self, idle_timeout: Duration) {
        let expired: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.idle_for() >= idle_timeout)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            tracing::info!(pair = %key, "Evicting idle engine pool");
            self.remove(&key);
        }
    }
}
