use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

/// Logical resources cached on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Users,
    Todos,
    StorageList,
}

impl QueryKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKey::Users => "users",
            QueryKey::Todos => "todos",
            QueryKey::StorageList => "storage-list",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Entry {
    value: Option<Value>,
    stale: bool,
}

/// Client-side cache of query results.
///
/// Invalidating a key marks its value stale, bumps the generation counter and
/// notifies subscribers, who decide whether to refetch.
#[derive(Debug)]
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    generation: AtomicU64,
    invalidations: broadcast::Sender<QueryKey>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            invalidations,
        }
    }

    /// The cached value of `key`, stale or not.
    pub fn get<T: DeserializeOwned>(&self, key: QueryKey) -> Option<T> {
        let value = self.entries.get(&key)?.value.clone()?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%key, "Cached value has an unexpected shape: {e}");
                None
            }
        }
    }

    /// Store a fresh value for `key`.
    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(
            key,
            Entry {
                value: Some(value),
                stale: false,
            },
        );
        Ok(())
    }

    pub fn invalidate(&self, key: QueryKey) {
        self.entries
            .entry(key)
            .and_modify(|e| e.stale = true)
            .or_insert(Entry {
                value: None,
                stale: true,
            });
        self.generation.fetch_add(1, Ordering::SeqCst);
        // Nobody listening is fine.
        let _ = self.invalidations.send(key);
    }

    /// Whether `key` needs a refetch. Keys never fetched are stale.
    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_none_or(|e| e.stale || e.value.is_none())
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }
}
