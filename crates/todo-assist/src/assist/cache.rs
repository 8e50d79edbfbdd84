//! Response caching for the assistance gateway.
//!
//! Avoids calling the provider again for a request whose fingerprint was
//! answered recently. Entries expire after a fixed TTL: lookups drop stale
//! entries lazily and every [`SWEEP_INTERVAL`] puts a full sweep runs. When
//! full, expired entries go first, then the least recently used one.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace};

use super::fingerprint::Fingerprint;
use super::types::Assistance;

/// Default time-to-live for a cached response (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default maximum number of cached responses.
pub const DEFAULT_MAX_ENTRIES: usize = 512;

/// Puts between full expiry sweeps.
pub const SWEEP_INTERVAL: u64 = 64;

#[derive(Debug, Clone)]
struct CacheEntry {
    assistance: Assistance,
    expires_at: Instant,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Logical clock for recency.
    tick: u64,
    puts: u64,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| now < e.expires_at);
        before - self.entries.len()
    }

    fn evict_least_recent(&mut self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, v)| v.last_access)
            .map(|(k, _)| k.clone())
        {
            trace!("Evicting cached response {}", oldest_key.short());
            self.entries.remove(&oldest_key);
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Process-wide response cache shared by concurrent callers.
///
/// All state sits behind one mutex; no `.await` happens while it is held.
#[derive(Debug)]
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    /// Create a cache with the given TTL and capacity (at least one entry).
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Look up a live entry.
    pub fn get(&self, key: &Fingerprint) -> Option<Assistance> {
        self.get_at(key, Instant::now())
    }

    /// Look up a live entry as of `now`. A hit requires `now < expires_at`;
    /// an expired entry is removed and counts as a miss.
    pub fn get_at(&self, key: &Fingerprint, now: Instant) -> Option<Assistance> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let tick = state.next_tick();

        let live = match state.entries.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.last_access = tick;
                Some(entry.assistance.clone())
            }
            Some(_) => {
                state.entries.remove(key);
                debug!("Cached response {} expired", key.short());
                None
            }
            None => None,
        };

        if live.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        live
    }

    /// Like [`get`](Self::get) but leaves counters and recency untouched.
    pub fn peek(&self, key: &Fingerprint) -> Option<Assistance> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .entries
            .get(key)
            .filter(|e| Instant::now() < e.expires_at)
            .map(|e| e.assistance.clone())
    }

    /// Store with the cache's TTL.
    pub fn put(&self, key: Fingerprint, assistance: Assistance) {
        self.put_at(key, assistance, self.ttl, Instant::now());
    }

    /// Store with an explicit TTL.
    pub fn put_with_ttl(&self, key: Fingerprint, assistance: Assistance, ttl: Duration) {
        self.put_at(key, assistance, ttl, Instant::now());
    }

    pub fn put_at(&self, key: Fingerprint, assistance: Assistance, ttl: Duration, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.puts += 1;
        if state.puts % SWEEP_INTERVAL == 0 {
            let purged = state.purge_expired(now);
            if purged > 0 {
                debug!("Cache sweep dropped {purged} expired responses");
            }
        }

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            state.purge_expired(now);
            if state.entries.len() >= self.max_entries {
                state.evict_least_recent();
            }
        }

        let tick = state.next_tick();
        state.entries.insert(
            key,
            CacheEntry {
                assistance,
                expires_at: now + ttl,
                last_access: tick,
            },
        );
    }

    /// Drop all expired entries as of `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.purge_expired(now)
    }

    /// Number of stored entries, including ones that expired but were not
    /// yet swept.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.hits
    }

    pub fn misses(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.misses
    }

    /// Hit rate as a fraction (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let total = state.hits + state.misses;
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                state.hits as f64 / total as f64
            },
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}
