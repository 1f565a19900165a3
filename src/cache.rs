//! In-memory cache of resolutions with a time-to-live.

use crate::types::resolution::Resolution;
use crate::types::station::LatLon;
use log::debug;
use std::collections::{hash_map::Entry, HashMap};
use std::hash::Hash;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A map whose entries expire `ttl` after they were inserted.
///
/// Expired entries are dropped on lookup of their key, on every insert and by
/// [`TtlCache::purge_expired`], so the map never outgrows the entries of one TTL window.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The value stored for `key`, if it has not expired yet.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => {
                return Some(value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Stores `value` and returns what the cache now holds for `key`.
    ///
    /// If another task stored a fresh value for `key` in the meantime, that value is kept and
    /// returned instead. Expired entries of other keys are dropped first.
    pub async fn insert(&self, key: K, value: V) -> V {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, (inserted, _)| inserted.elapsed() < self.ttl);
        if entries.len() < before {
            debug!("Dropped {} expired cache entries", before - entries.len());
        }

        match entries.entry(key) {
            Entry::Occupied(entry) => entry.get().1.clone(),
            Entry::Vacant(entry) => {
                entry.insert((Instant::now(), value.clone()));
                value
            }
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, (inserted, _)| inserted.elapsed() < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// What a resolution was requested for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolveKey {
    /// A normalized address: trimmed, lowercase, single spaces.
    Address { address: String, years: (i32, i32) },
    /// Exact coordinates, compared bit for bit.
    Location { bits: (u64, u64), years: (i32, i32) },
}

impl ResolveKey {
    pub fn address(address: &str, years: &RangeInclusive<i32>) -> Self {
        let address = address
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        ResolveKey::Address {
            address,
            years: (*years.start(), *years.end()),
        }
    }

    pub fn location(location: LatLon, years: &RangeInclusive<i32>) -> Self {
        ResolveKey::Location {
            bits: (location.0.to_bits(), location.1.to_bits()),
            years: (*years.start(), *years.end()),
        }
    }
}

/// Cache shared by an [`IsdClient`](crate::IsdClient) and its clones.
pub type ResolutionCache = TtlCache<ResolveKey, Arc<Resolution>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_key_normalization() {
        let years = 2020..=2021;
        assert_eq!(
            ResolveKey::address("  Boston,   MA ", &years),
            ResolveKey::address("boston, ma", &years)
        );
        assert_ne!(
            ResolveKey::address("Boston, MA", &years),
            ResolveKey::address("Boston, MA", &(2020..=2022))
        );
        assert_ne!(
            ResolveKey::location(LatLon(1.0, 2.0), &years),
            ResolveKey::location(LatLon(1.0, 2.000001), &years)
        );
    }

    #[tokio::test]
    async fn test_entries_hit_then_expire() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(50));
        assert_eq!(cache.insert("a", 1).await, 1);
        assert_eq!(cache.get(&"a").await, Some(1));
        // A fresh entry is not overwritten.
        assert_eq!(cache.insert("a", 2).await, 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get(&"a").await, None);
        assert!(cache.is_empty().await);

        assert_eq!(cache.insert("a", 3).await, 3);
        assert_eq!(cache.get(&"a").await, Some(3));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache: TtlCache<u8, u8> = TtlCache::new(Duration::from_millis(30));
        cache.insert(1, 1).await;
        cache.insert(2, 2).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.purge_expired().await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_drops_expired_entries_of_other_keys() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_millis(100));
        for key in 0..1000 {
            cache.insert(key, key).await;
        }

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.insert(5000, 1).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&5000).await, Some(1));
    }
}
