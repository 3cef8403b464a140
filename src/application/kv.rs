//! Narrow key-value store interface shared by the invite cache and the rate
//! limiter.
//!
//! The contract is deliberately minimal: get, and put-with-TTL. There is no
//! atomic increment and no conditional put, so every consumer has to tolerate
//! lost or duplicated writes (see the rate limiter for the consequences).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

impl KvError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Best-effort TTL key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Store `value` under `key`, expiring after `ttl`. An existing entry is
    /// replaced and its remaining TTL discarded.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KvError>;
}
