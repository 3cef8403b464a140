//! In-process key-value store with real TTL expiry.
//!
//! Backs tests and single-node development runs. Expired entries are dropped
//! lazily on read and swept opportunistically on write, so the map does not
//! grow without bound under churn.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::application::kv::{KvError, KvStore};

use super::lock::mutex_lock;

const SOURCE: &str = "kv::memory";

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KvError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "put");
        let now = Instant::now();

        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now.checked_add(ttl).unwrap_or(now),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn stores_and_returns_value_within_ttl() {
        let store = MemoryKvStore::new();

        assert!(store.get("public:acme").await.expect("get").is_none());

        store
            .put("public:acme", b"payload".to_vec(), TTL)
            .await
            .expect("put");

        let value = store.get("public:acme").await.expect("get").expect("value");
        assert_eq!(value, b"payload");
    }

    #[tokio::test]
    async fn zero_ttl_entry_is_immediately_expired() {
        let store = MemoryKvStore::new();

        store
            .put("public:acme", b"payload".to_vec(), Duration::ZERO)
            .await
            .expect("put");

        assert!(store.get("public:acme").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn put_replaces_existing_value() {
        let store = MemoryKvStore::new();

        store
            .put("rl:key:1", b"1".to_vec(), TTL)
            .await
            .expect("put");
        store
            .put("rl:key:1", b"2".to_vec(), TTL)
            .await
            .expect("put");

        let value = store.get("rl:key:1").await.expect("get").expect("value");
        assert_eq!(value, b"2");
    }
}
