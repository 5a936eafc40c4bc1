use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

struct CacheItem<V> {
    data: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheItem<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

pub struct TtlCache<V> {
    default_ttl: Duration,
    items: Mutex<HashMap<String, CacheItem<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            items: Mutex::new(HashMap::new()),
        }
    }

    fn items(&self) -> MutexGuard<'_, HashMap<String, CacheItem<V>>> {
        // A panic while holding the lock can't leave a half-written entry.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut items = self.items();
        let now = Instant::now();
        match items.get(key) {
            Some(item) if item.is_expired(now) => {
                items.remove(key);
                None
            }
            Some(item) => Some(item.data.clone()),
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, data: V) {
        self.insert_with_ttl(key, data, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: impl Into<String>, data: V, ttl: Duration) {
        let mut items = self.items();
        let now = Instant::now();
        items.retain(|_, item| !item.is_expired(now));
        items.insert(
            key.into(),
            CacheItem {
                data,
                inserted_at: now,
                ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.items().remove(key);
    }

    pub fn clear(&self) {
        self.items().clear();
    }

    /// Expired entries count until the next read of their key or the next insert.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
