//! Per-key single-flight cache.

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

use crate::Result;

/// A cache whose entries are written once, on first successful creation.
///
/// Concurrent requests for the same key share one in-flight creation. A failed
/// creation is not stored; the next request runs it again.
#[derive(Debug)]
pub struct SingleFlight<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, creating it with `create` if absent.
    pub async fn get_or_try_init<F, Fut>(&self, key: K, create: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = self.cells.lock().await.entry(key).or_default().clone();
        cell.get_or_try_init(create).await.cloned()
    }

    /// Returns the cached value for `key` without creating it.
    pub async fn get(&self, key: &K) -> Option<V> {
        let cell = self.cells.lock().await.get(key).cloned()?;
        cell.get().cloned()
    }
}
