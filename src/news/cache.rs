//! In-memory article cache keyed by normalized preference sets.
//!
//! Entries are replaced wholesale on every successful refresh and are kept
//! past their freshness window so the service can fall back to them when the
//! provider is unavailable.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::Article;

const DEFAULT_KEY: &str = "default";
const KEY_DELIMITER: &str = ",";

/// Order-independent identifier for a set of preference tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreferenceKey(String);

impl PreferenceKey {
    /// Sort the tags lexicographically and join them; an empty result maps
    /// to the `default` sentinel.
    pub fn from_preferences(preferences: &[String]) -> Self {
        let mut sorted = preferences.to_vec();
        sorted.sort_unstable();
        Self::from_sorted(&sorted)
    }

    /// Join tags that are already in lexicographic order.
    pub fn from_sorted(sorted: &[String]) -> Self {
        let joined = sorted.join(KEY_DELIMITER);
        if joined.is_empty() {
            Self(DEFAULT_KEY.to_string())
        } else {
            Self(joined)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub articles: Vec<Article>,
    pub fetched_at: DateTime<Utc>,
}

pub struct NewsCache {
    entries: DashMap<PreferenceKey, CacheEntry>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl NewsCache {
    pub fn new(ttl: Duration, max_entries: Option<usize>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.filter(|limit| *limit > 0),
        }
    }

    pub fn get(&self, key: &PreferenceKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store `articles` under `key`, replacing any previous entry.
    pub fn put(&self, key: PreferenceKey, articles: Vec<Article>) {
        if let Some(limit) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= limit {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                articles,
                fetched_at: Utc::now(),
            },
        );
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.is_fresh_at(entry, Utc::now())
    }

    fn is_fresh_at(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.fetched_at < self.ttl
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        // Collect the victim first; removing while iterating would deadlock the shard.
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().fetched_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            log::debug!("news cache full; evicting entry for '{}'", key);
            self.entries.remove(&key);
        }
    }

    /// Move an entry's fetch timestamp into the past.
    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &PreferenceKey, by: Duration) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.fetched_at = entry.fetched_at - by;
        }
    }
}

impl Default for NewsCache {
    fn default() -> Self {
        Self::new(Duration::minutes(5), None)
    }
}
