//! Read-through cache for public invitation views.
//!
//! Reads check the key-value store first and only fall back to the
//! relational source on a miss, populating the store on the way out. There
//! is no invalidation path: writers rely on TTL expiry, so a reader can see
//! up to `ttl` seconds of staleness after an edit. Two concurrent misses for
//! the same slug may both fall through and both populate; the writes carry
//! equivalent content, so last-writer-wins is harmless.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tracing::debug;

use crate::application::kv::{KvError, KvStore};
use crate::application::repos::{RepoError, SectionsRepo, TenantsRepo};
use crate::domain::invite::InviteModel;

const METRIC_CACHE_HIT: &str = "invito_invite_cache_hit_total";
const METRIC_CACHE_MISS: &str = "invito_invite_cache_miss_total";
const METRIC_CACHE_STORE: &str = "invito_invite_cache_store_total";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum InviteError {
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct InviteCache {
    kv: Arc<dyn KvStore>,
    tenants: Arc<dyn TenantsRepo>,
    sections: Arc<dyn SectionsRepo>,
    namespace: String,
    ttl: Duration,
}

impl InviteCache {
    pub fn new(
        kv: Arc<dyn KvStore>,
        tenants: Arc<dyn TenantsRepo>,
        sections: Arc<dyn SectionsRepo>,
        namespace: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            kv,
            tenants,
            sections,
            namespace: namespace.into(),
            ttl,
        }
    }

    fn cache_key(&self, slug: &str) -> String {
        format!("{}:{}", self.namespace, slug)
    }

    /// Resolve the public view for `slug`.
    ///
    /// Returns `None` when the slug is unknown or the tenant is not
    /// published; the two cases are indistinguishable on purpose. Negative
    /// results are never cached, so a tenant becomes visible the moment it
    /// is published rather than after a stale negative entry expires.
    pub async fn get(&self, slug: &str) -> Result<Option<InviteModel>, InviteError> {
        let key = self.cache_key(slug);

        if let Some(bytes) = self.kv.get(&key).await? {
            match serde_json::from_slice::<InviteModel>(&bytes) {
                Ok(model) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    return Ok(Some(model));
                }
                Err(error) => {
                    // Undecodable entry: fall through to the relational
                    // source as if nothing was cached.
                    debug!(
                        target: "invito::invite",
                        slug,
                        error = %error,
                        "Discarding undecodable cache entry"
                    );
                }
            }
        }
        counter!(METRIC_CACHE_MISS).increment(1);

        let Some(tenant) = self.tenants.find_published_by_slug(slug).await? else {
            return Ok(None);
        };

        let sections = self.sections.list_sections_ordered(tenant.id).await?;
        let model = InviteModel::assemble(tenant, sections);

        match serde_json::to_vec(&model) {
            Ok(bytes) => {
                self.kv.put(&key, bytes, self.ttl).await?;
                counter!(METRIC_CACHE_STORE).increment(1);
            }
            Err(error) => {
                // Serving still succeeds when the entry cannot be encoded.
                debug!(
                    target: "invito::invite",
                    slug,
                    error = %error,
                    "Skipping cache store for unencodable model"
                );
            }
        }

        Ok(Some(model))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::domain::entities::{SectionRecord, TenantRecord};
    use crate::domain::types::TenantStatus;
    use crate::infra::kv::MemoryKvStore;

    struct FakeTenants {
        tenants: Mutex<HashMap<String, TenantRecord>>,
        lookups: AtomicUsize,
    }

    impl FakeTenants {
        fn new(tenants: Vec<TenantRecord>) -> Self {
            Self {
                tenants: Mutex::new(
                    tenants
                        .into_iter()
                        .map(|tenant| (tenant.slug.clone(), tenant))
                        .collect(),
                ),
                lookups: AtomicUsize::new(0),
            }
        }

        fn publish(&self, tenant: TenantRecord) {
            self.tenants
                .lock()
                .expect("tenants lock")
                .insert(tenant.slug.clone(), tenant);
        }

        fn lookup_count(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TenantsRepo for FakeTenants {
        async fn find_published_by_slug(
            &self,
            slug: &str,
        ) -> Result<Option<TenantRecord>, RepoError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .tenants
                .lock()
                .expect("tenants lock")
                .get(slug)
                .filter(|tenant| tenant.status == TenantStatus::Published)
                .cloned())
        }
    }

    struct FakeSections(Vec<SectionRecord>);

    #[async_trait]
    impl SectionsRepo for FakeSections {
        async fn list_sections_ordered(
            &self,
            tenant_id: Uuid,
        ) -> Result<Vec<SectionRecord>, RepoError> {
            Ok(self
                .0
                .iter()
                .filter(|section| section.tenant_id == tenant_id)
                .cloned()
                .collect())
        }
    }

    fn tenant(slug: &str, status: TenantStatus) -> TenantRecord {
        TenantRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: "Celebration".to_string(),
            display_name: "Ada & Alan".to_string(),
            event_date: "2026-09-12".to_string(),
            status,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn section(tenant_id: Uuid, order_index: i32, content_json: &str) -> SectionRecord {
        SectionRecord {
            id: Uuid::new_v4(),
            tenant_id,
            kind: "story".to_string(),
            order_index,
            content_json: content_json.to_string(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn cache_with(
        kv: Arc<MemoryKvStore>,
        tenants: Arc<FakeTenants>,
        sections: Vec<SectionRecord>,
    ) -> InviteCache {
        InviteCache::new(
            kv,
            tenants,
            Arc::new(FakeSections(sections)),
            "public",
            DEFAULT_CACHE_TTL,
        )
    }

    #[tokio::test]
    async fn sections_sorted_regardless_of_storage_order() {
        let acme = tenant("acme", TenantStatus::Published);
        let id = acme.id;
        let tenants = Arc::new(FakeTenants::new(vec![acme]));
        let cache = cache_with(
            Arc::new(MemoryKvStore::new()),
            tenants,
            vec![
                section(id, 2, "{}"),
                section(id, 0, "{}"),
                section(id, 1, "{}"),
            ],
        );

        let model = cache.get("acme").await.expect("get").expect("model");
        let order: Vec<i32> = model
            .sections
            .iter()
            .map(|section| section.order_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn second_get_within_ttl_is_served_from_cache() {
        let acme = tenant("acme", TenantStatus::Published);
        let id = acme.id;
        let tenants = Arc::new(FakeTenants::new(vec![acme]));
        let cache = cache_with(
            Arc::new(MemoryKvStore::new()),
            tenants.clone(),
            vec![section(id, 0, r#"{"headline":"welcome"}"#)],
        );

        let first = cache.get("acme").await.expect("get").expect("model");
        let second = cache.get("acme").await.expect("get").expect("model");

        assert_eq!(first, second);
        assert_eq!(tenants.lookup_count(), 1);
    }

    #[tokio::test]
    async fn unpublished_tenant_is_absent_and_never_cached() {
        let kv = Arc::new(MemoryKvStore::new());
        let tenants = Arc::new(FakeTenants::new(vec![tenant("acme", TenantStatus::Draft)]));
        let cache = cache_with(kv.clone(), tenants, vec![]);

        assert!(cache.get("acme").await.expect("get").is_none());
        assert!(kv.get("public:acme").await.expect("kv get").is_none());
    }

    #[tokio::test]
    async fn negative_lookup_is_not_cached_so_publishing_is_immediately_visible() {
        let tenants = Arc::new(FakeTenants::new(vec![]));
        let cache = cache_with(Arc::new(MemoryKvStore::new()), tenants.clone(), vec![]);

        assert!(cache.get("acme").await.expect("get").is_none());

        tenants.publish(tenant("acme", TenantStatus::Published));
        assert!(cache.get("acme").await.expect("get").is_some());
    }

    #[tokio::test]
    async fn undecodable_cache_entry_is_treated_as_miss() {
        let acme = tenant("acme", TenantStatus::Published);
        let id = acme.id;
        let kv = Arc::new(MemoryKvStore::new());
        kv.put("public:acme", b"{definitely not json".to_vec(), DEFAULT_CACHE_TTL)
            .await
            .expect("seed kv");

        let tenants = Arc::new(FakeTenants::new(vec![acme]));
        let cache = cache_with(kv.clone(), tenants, vec![section(id, 0, "{}")]);

        let model = cache.get("acme").await.expect("get").expect("model");
        assert_eq!(model.tenant.slug, "acme");

        // The broken entry was replaced by a decodable one.
        let stored = kv.get("public:acme").await.expect("kv get").expect("entry");
        assert!(serde_json::from_slice::<InviteModel>(&stored).is_ok());
    }

    #[tokio::test]
    async fn live_stale_entry_is_served_until_ttl_expiry() {
        // The tenant was unpublished after its view got cached; within the
        // TTL the stale view keeps being served. That is the documented
        // staleness bound, not a defect.
        let acme = tenant("acme", TenantStatus::Published);
        let id = acme.id;
        let stale = InviteModel::assemble(acme, vec![section(id, 0, "{}")]);
        let bytes = serde_json::to_vec(&stale).expect("encode stale model");

        let kv = Arc::new(MemoryKvStore::new());
        kv.put("public:acme", bytes, DEFAULT_CACHE_TTL)
            .await
            .expect("seed kv");

        let tenants = Arc::new(FakeTenants::new(vec![]));
        let cache = cache_with(kv, tenants, vec![]);

        assert!(cache.get("acme").await.expect("get").is_some());
    }

    #[tokio::test]
    async fn expired_stale_entry_yields_absent_for_unpublished_tenant() {
        let acme = tenant("acme", TenantStatus::Published);
        let id = acme.id;
        let stale = InviteModel::assemble(acme, vec![section(id, 0, "{}")]);
        let bytes = serde_json::to_vec(&stale).expect("encode stale model");

        let kv = Arc::new(MemoryKvStore::new());
        kv.put("public:acme", bytes, Duration::ZERO)
            .await
            .expect("seed kv");

        let tenants = Arc::new(FakeTenants::new(vec![]));
        let cache = cache_with(kv, tenants, vec![]);

        assert!(cache.get("acme").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn malformed_section_content_yields_empty_document() {
        let acme = tenant("acme", TenantStatus::Published);
        let id = acme.id;
        let tenants = Arc::new(FakeTenants::new(vec![acme]));
        let cache = cache_with(
            Arc::new(MemoryKvStore::new()),
            tenants,
            vec![
                section(id, 0, "{broken"),
                section(id, 1, r#"{"venue":"Rosewood Hall"}"#),
            ],
        );

        let model = cache.get("acme").await.expect("get").expect("model");
        assert!(model.sections[0].content.is_empty());
        assert!(!model.sections[1].content.is_empty());
    }
}
