use futures_util::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{AppError, Result};

type BatchResult<K, V> = std::result::Result<Arc<HashMap<K, V>>, Arc<AppError>>;

#[derive(Debug)]
enum LoadError {
    Batch(Arc<AppError>),
    Missing,
}

/// Deduplicating batch loader with a fixed caching window.
///
/// Concurrent loads of the same key share one in-flight fetch; keys the
/// fetch does not return are left out of the result and are not cached.
#[derive(Clone)]
pub struct BatchLoader<K, V> {
    cache: Cache<K, V>,
}

impl<K, V> BatchLoader<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Load every key, issuing at most one `fetch` for the ones not cached.
    pub async fn load_many<F, Fut>(&self, keys: &[K], fetch: F) -> Result<HashMap<K, V>>
    where
        F: FnOnce(Vec<K>) -> Fut,
        Fut: Future<Output = Result<HashMap<K, V>>> + Send + 'static,
    {
        let mut seen = HashSet::new();
        let mut found = HashMap::new();
        let mut misses = Vec::new();

        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }
            match self.cache.get(key).await {
                Some(value) => {
                    found.insert(key.clone(), value);
                }
                None => misses.push(key.clone()),
            }
        }

        if misses.is_empty() {
            return Ok(found);
        }

        tracing::debug!(hits = found.len(), misses = misses.len(), "Batch load");

        let pending = fetch(misses.clone());
        let batch: Shared<BoxFuture<'static, BatchResult<K, V>>> = async move {
            pending.await.map(Arc::new).map_err(Arc::new)
        }
        .boxed()
        .shared();

        for key in misses {
            let batch = batch.clone();
            let lookup = key.clone();
            let init = async move {
                let loaded = batch.await.map_err(LoadError::Batch)?;
                loaded.get(&lookup).cloned().ok_or(LoadError::Missing)
            };

            match self.cache.try_get_with(key.clone(), init).await {
                Ok(value) => {
                    found.insert(key, value);
                }
                Err(err) => match err.as_ref() {
                    LoadError::Missing => {}
                    LoadError::Batch(cause) => {
                        return Err(AppError::internal(format!("batch load failed: {}", cause)));
                    }
                },
            }
        }

        Ok(found)
    }

    pub async fn invalidate(&self, key: &K) {
        self.cache.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
