// src/cache.rs
//! Time-bounded, in-process cache for generated feeds.
//!
//! One slot per key. A slot's async mutex is held for the whole regeneration, so
//! concurrent callers on a stale or empty slot wait for the in-flight result
//! instead of starting their own (single-flight). A failed regeneration is handed
//! to the callers that were already waiting, then forgotten: the next caller retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::debug;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Arc<str>,
    pub fingerprint: String,
    pub generated_at: Instant,
}

impl CacheEntry {
    pub fn new(body: String, generated_at: Instant) -> Self {
        let fingerprint = fingerprint(&body);
        Self {
            body: Arc::from(body),
            fingerprint,
            generated_at,
        }
    }

    /// Valid while `now - generated_at < window` (absolute TTL, no sliding refresh).
    pub fn is_fresh(&self, window: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.generated_at) < window
    }
}

#[derive(Default)]
struct SlotState {
    entry: Option<CacheEntry>,
    /// Error of the most recent attempt, tagged with that attempt's number.
    last_failure: Option<(u64, FeedError)>,
}

#[derive(Default)]
struct SlotInner {
    /// Regenerations finished on this slot, successful or not.
    attempts: AtomicU64,
    state: tokio::sync::Mutex<SlotState>,
}

type Slot = Arc<SlotInner>;

pub struct FeedCache {
    window: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl FeedCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn slot(&self, key: &str) -> Slot {
        let mut map = match self.slots.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        map.entry(key.to_string()).or_default().clone()
    }

    /// Return the fresh entry for `key`, or run `generate` and store its output.
    pub async fn get_or_generate<F, Fut>(
        &self,
        key: &str,
        generate: F,
    ) -> Result<(CacheEntry, CacheStatus), FeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, FeedError>>,
    {
        let slot = self.slot(key);
        let seen = slot.attempts.load(Ordering::Acquire);
        let mut guard = slot.state.lock().await;

        if let Some(entry) = guard.entry.as_ref() {
            if entry.is_fresh(self.window, Instant::now()) {
                debug!(key, "serving feed from cache");
                counter!("feed_cache_hits_total").increment(1);
                return Ok((entry.clone(), CacheStatus::Hit));
            }
        }

        // An attempt finished while we waited for the lock and it failed: share it.
        if let Some((attempt, err)) = guard.last_failure.as_ref() {
            if *attempt > seen {
                debug!(key, error = %err, "sharing failure of in-flight regeneration");
                return Err(err.clone());
            }
        }

        counter!("feed_cache_misses_total").increment(1);
        let result = generate().await;
        let attempt = slot.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        match result {
            Ok(body) => {
                let entry = CacheEntry::new(body, Instant::now());
                guard.entry = Some(entry.clone());
                guard.last_failure = None;
                Ok((entry, CacheStatus::Miss))
            }
            Err(e) => {
                guard.last_failure = Some((attempt, e.clone()));
                Err(e)
            }
        }
    }

    /// Drop every stored entry.
    pub async fn clear(&self) {
        let slots: Vec<Slot> = {
            let map = match self.slots.lock() {
                Ok(g) => g,
                Err(poison) => poison.into_inner(),
            };
            map.values().cloned().collect()
        };
        for slot in slots {
            let mut state = slot.state.lock().await;
            state.entry = None;
            state.last_failure = None;
        }
    }
}

/// Hex SHA-256 of the document.
pub fn fingerprint(body: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(body.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
