use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use soloist::store::{LeaseStore, StoreError};

/// In-process [`LeaseStore`] with real TTL expiry, for tests.
///
/// Semantics match the Redis adapter:
/// - `put_if_absent` only writes when the key is absent or expired,
/// - `compare_and_extend` mutates nothing unless the stored value matches,
/// - `fetch` treats an expired entry as absent.
///
/// Clones share the same underlying map, so several leases (and the
/// supervisor) can contend on one store. `set_offline(true)` makes every
/// operation fail with [`StoreError::Unreachable`], to simulate losing the
/// store mid-run.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    offline: bool,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Drop a key outright, as if its TTL had lapsed.
    pub fn evict(&self, key: &str) {
        self.lock().entries.remove(key);
    }

    /// Overwrite a key unconditionally, as if another writer had claimed it.
    pub fn hijack(&self, key: &str, value: &str, ttl: Duration) {
        self.lock().entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Raw view of a live entry: its value and remaining TTL. `None` if the
    /// key is absent or expired. Useful for asserting that an operation
    /// mutated nothing.
    pub fn raw_get(&self, key: &str) -> Option<(String, Duration)> {
        let inner = self.lock();
        let entry = inner.entries.get(key)?;
        let now = Instant::now();
        if entry.expires_at <= now {
            return None;
        }
        Some((entry.value.clone(), entry.expires_at - now))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    fn check_online(inner: &Inner) -> Result<(), StoreError> {
        if inner.offline {
            return Err(StoreError::Unreachable("memory store is offline".to_string()));
        }
        Ok(())
    }

    fn purge_expired(inner: &mut Inner, now: Instant) {
        inner.entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl LeaseStore for MemoryStore {
    async fn put_if_absent(&self, key: &str, value: &str, ttl_ms: u64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;

        let now = Instant::now();
        Self::purge_expired(&mut inner, now);

        if inner.entries.contains_key(key) {
            return Ok(false);
        }

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + Duration::from_millis(ttl_ms),
            },
        );
        Ok(true)
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;

        let now = Instant::now();
        Self::purge_expired(&mut inner, now);

        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn compare_and_extend(
        &self,
        key: &str,
        expected: &str,
        ttl_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;

        let now = Instant::now();
        Self::purge_expired(&mut inner, now);

        match inner.entries.get_mut(key) {
            Some(entry) if entry.value == expected => {
                entry.expires_at = now + Duration::from_millis(ttl_ms);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
