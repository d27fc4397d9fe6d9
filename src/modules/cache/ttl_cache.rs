use moka::sync::Cache;
use moka::Expiry;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Expires every entry at the deadline it was stored with.
struct PerEntryTtl;

impl<K, V> Expiry<K, Entry<V>> for PerEntryTtl {
    fn expire_after_create(&self, _key: &K, entry: &Entry<V>, created_at: Instant) -> Option<Duration> {
        Some(entry.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &K,
        entry: &Entry<V>,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.expires_at.saturating_duration_since(updated_at))
    }
}

/// In-memory key/value cache where each entry carries its own TTL.
///
/// Cloning is cheap and clones share storage.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    inner: Cache<K, Entry<V>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
            default_ttl,
        }
    }

    /// Value for `key`, unless absent or past its TTL
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.inner.get(key)?;
        if Instant::now() >= entry.expires_at {
            self.inner.invalidate(key);
            return None;
        }
        Some(entry.value)
    }

    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.inner.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// `set` with the cache's default TTL
    pub fn insert(&self, key: K, value: V) {
        self.set(key, value, self.default_ttl);
    }

    pub fn delete(&self, key: &K) {
        self.inner.invalidate(key);
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
