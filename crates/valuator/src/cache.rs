//! Time-bounded valuation cache
//!
//! Entries are keyed by project id plus a hash of every input that changes the
//! valuation, so editing a project's contracts or the lookback window never
//! serves a stale figure.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use qacc_types::{MarketCapResult, Project};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub project_id: String,
    pub inputs_hash: u64,
}

impl CacheKey {
    pub fn for_project(project: &Project, lookback_hours: u32) -> Self {
        Self {
            project_id: project.id.clone(),
            inputs_hash: inputs_hash(project, lookback_hours),
        }
    }
}

/// Hash of the valuation inputs of `project`
pub fn inputs_hash(project: &Project, lookback_hours: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    project.abc.hash(&mut hasher);
    project.genesis_timestamp_ms.hash(&mut hasher);
    lookback_hours.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: MarketCapResult,
    inserted_at: Instant,
}

pub struct ValuationCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ValuationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached result if present and not expired
    pub fn get(&self, key: &CacheKey) -> Option<MarketCapResult> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.value)
    }

    pub fn insert(&self, key: CacheKey, value: MarketCapResult) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry of a project
    pub fn invalidate(&self, project_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|key, _| key.project_id != project_id);
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
