use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, TenantsRepo};
use crate::domain::entities::TenantRecord;
use crate::domain::types::TenantStatus;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(FromRow)]
struct TenantRow {
    id: Uuid,
    slug: String,
    title: String,
    display_name: String,
    event_date: String,
    status: TenantStatus,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TenantRow> for TenantRecord {
    fn from(row: TenantRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            display_name: row.display_name,
            event_date: row.event_date,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TenantsRepo for PostgresRepositories {
    async fn find_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<TenantRecord>, RepoError> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, slug, title, display_name, event_date, status, created_at, updated_at
            FROM tenants
            WHERE slug = $1 AND status = $2
            "#,
        )
        .bind(slug)
        .bind(TenantStatus::Published)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TenantRecord::from))
    }
}
