//! Key-value store adapters.

mod lock;
mod memory;

pub use memory::MemoryKvStore;

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::info;

use crate::application::kv::{KvError, KvStore};

use super::error::InfraError;

/// Redis-backed store. Cache entries and rate-limit buckets live here in
/// production so that every replica observes the same state.
pub struct RedisKvStore {
    connection: ConnectionManager,
}

impl RedisKvStore {
    /// Connect to Redis at `url`. The connection manager reconnects on its
    /// own after transient failures; individual commands still surface
    /// errors while the link is down.
    pub async fn connect(url: &str) -> Result<Self, InfraError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client =
            redis::Client::open(url).map_err(|err| InfraError::key_value(err.to_string()))?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|err| InfraError::key_value(err.to_string()))?;

        info!(target: "invito::kv", "Connected to Redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let mut connection = self.connection.clone();
        connection
            .get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(KvError::unavailable)
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KvError> {
        let mut connection = self.connection.clone();
        // SETEX has second granularity; a sub-second TTL still has to expire
        // eventually, so round up to one second.
        let seconds = ttl.as_secs().max(1);
        connection
            .set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(KvError::unavailable)
    }
}
