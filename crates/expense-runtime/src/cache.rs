//! Keyed cache with wall-clock expiry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

/// A cached value and the window it is valid for.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Entry stored at `now`, valid for `ttl`; expiry saturates at the
    /// latest representable instant.
    fn new(value: V, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// `true` while `now` is before the expiry instant.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Cache whose entries expire a fixed `ttl` after insertion.
///
/// Callers pass `now` explicitly so expiry is driven by whatever clock the
/// owner uses. Expired entries stay stored until replaced or invalidated.
#[derive(Debug, Clone)]
pub struct ExpiringCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V> ExpiringCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The value under `key` if it has not expired at `now`.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| &entry.value)
    }

    /// The entry under `key`, expired or not.
    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Store `value`, replacing any previous entry, and return a reference
    /// to it.
    pub fn insert(&mut self, key: K, value: V, now: DateTime<Utc>) -> &V {
        let entry = CacheEntry::new(value, now, self.ttl);
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                &slot.into_mut().value
            }
            Entry::Vacant(slot) => &slot.insert(entry).value,
        }
    }

    /// Return the fresh value under `key`, or store the result of `fetch`.
    ///
    /// `force` refetches even when the entry is still fresh.
    pub fn get_or_refresh(
        &mut self,
        key: K,
        now: DateTime<Utc>,
        force: bool,
        fetch: impl FnOnce() -> V,
    ) -> &V {
        let ttl = self.ttl;
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                if force || !slot.get().is_fresh(now) {
                    slot.insert(CacheEntry::new(fetch(), now, ttl));
                }
                &slot.into_mut().value
            }
            Entry::Vacant(slot) => &slot.insert(CacheEntry::new(fetch(), now, ttl)).value,
        }
    }

    /// Drop the entry under `key`; returns whether one existed.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Expiry instant of the entry under `key`, if any.
    pub fn expires_at(&self, key: &K) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.expires_at)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
