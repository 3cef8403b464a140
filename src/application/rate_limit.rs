//! Fixed-window rate limiting backed by the shared key-value store.
//!
//! Buckets are keyed by caller key and window index and expire via store
//! TTL; nothing is ever deleted explicitly and no state lives in-process,
//! so any number of replicas share the same budget.
//!
//! Two semantic limits are intentional and must not be "fixed":
//! - fixed windows, not sliding ones: a caller can land `limit` requests at
//!   the tail of one window and `limit` more at the head of the next;
//! - the counter read-then-write is not atomic (the store offers no
//!   increment), so concurrent attempts can exceed `limit` by a small
//!   margin. Limiting is approximate, never exact.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use metrics::counter;

use crate::application::kv::{KvError, KvStore};

const METRIC_ALLOWED: &str = "invito_rate_limit_allowed_total";
const METRIC_DENIED: &str = "invito_rate_limit_denied_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

pub struct RateLimiter {
    kv: Arc<dyn KvStore>,
    namespace: String,
}

impl RateLimiter {
    pub fn new(kv: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    /// Check (and on success consume) one unit of budget for `key`.
    ///
    /// A denied attempt performs no write: hammering a closed window does
    /// not extend or deepen the block.
    pub async fn check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateLimitDecision, KvError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.check_at(key, limit, window, now_ms).await
    }

    // Window indexes are derived from the epoch so every replica lands on
    // the same bucket for the same instant.
    pub(crate) async fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now_ms: u128,
    ) -> Result<RateLimitDecision, KvError> {
        let window_ms = window.as_millis().max(1);
        let window_start = now_ms / window_ms;
        let bucket_key = format!("{}:{}:{}", self.namespace, key, window_start);

        let count = match self.kv.get(&bucket_key).await? {
            Some(bytes) => parse_count(&bytes),
            None => 0,
        };

        if count >= u64::from(limit) {
            counter!(METRIC_DENIED).increment(1);
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
            });
        }

        let next = count + 1;
        self.kv
            .put(&bucket_key, next.to_string().into_bytes(), window)
            .await?;
        counter!(METRIC_ALLOWED).increment(1);

        let remaining = u32::try_from(u64::from(limit).saturating_sub(next)).unwrap_or(u32::MAX);
        Ok(RateLimitDecision {
            allowed: true,
            remaining,
        })
    }
}

/// Decode a stored counter, treating anything unreadable as zero — the same
/// local-recovery posture the invite cache takes for undecodable entries.
fn parse_count(bytes: &[u8]) -> u64 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::kv::MemoryKvStore;

    const WINDOW: Duration = Duration::from_secs(60);
    const NOW_MS: u128 = 1_760_000_000_000;

    fn limiter(kv: Arc<MemoryKvStore>) -> RateLimiter {
        RateLimiter::new(kv, "rl")
    }

    #[tokio::test]
    async fn five_attempts_allowed_then_sixth_denied() {
        let limiter = limiter(Arc::new(MemoryKvStore::new()));

        for expected_remaining in [4, 3, 2, 1, 0] {
            let decision = limiter
                .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
                .await
                .expect("check");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = limiter
            .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
            .await
            .expect("check");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn denied_attempts_do_not_consume_budget() {
        let kv = Arc::new(MemoryKvStore::new());
        let limiter = limiter(kv.clone());

        for _ in 0..5 {
            limiter
                .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
                .await
                .expect("check");
        }
        for _ in 0..3 {
            let decision = limiter
                .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
                .await
                .expect("check");
            assert!(!decision.allowed);
        }

        let bucket_key = format!("rl:rsvp:acme:203.0.113.9:{}", NOW_MS / WINDOW.as_millis());
        let stored = kv.get(&bucket_key).await.expect("kv get").expect("bucket");
        assert_eq!(stored, b"5");
    }

    #[tokio::test]
    async fn windows_are_tracked_independently() {
        let limiter = limiter(Arc::new(MemoryKvStore::new()));

        for _ in 0..5 {
            limiter
                .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
                .await
                .expect("check");
        }
        let exhausted = limiter
            .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
            .await
            .expect("check");
        assert!(!exhausted.allowed);

        // Next window: full budget again, untouched by the previous one.
        let next_window = NOW_MS + WINDOW.as_millis();
        let decision = limiter
            .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, next_window)
            .await
            .expect("check");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share_budget() {
        let limiter = limiter(Arc::new(MemoryKvStore::new()));

        for _ in 0..5 {
            limiter
                .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
                .await
                .expect("check");
        }

        let decision = limiter
            .check_at("rsvp:acme:198.51.100.7", 5, WINDOW, NOW_MS)
            .await
            .expect("check");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn unreadable_counter_is_treated_as_zero() {
        let kv = Arc::new(MemoryKvStore::new());
        let bucket_key = format!("rl:rsvp:acme:203.0.113.9:{}", NOW_MS / WINDOW.as_millis());
        kv.put(&bucket_key, b"garbage".to_vec(), WINDOW)
            .await
            .expect("seed kv");

        let limiter = limiter(kv.clone());
        let decision = limiter
            .check_at("rsvp:acme:203.0.113.9", 5, WINDOW, NOW_MS)
            .await
            .expect("check");

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);

        let stored = kv.get(&bucket_key).await.expect("kv get").expect("bucket");
        assert_eq!(stored, b"1");
    }
}
