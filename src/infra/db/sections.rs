use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, SectionsRepo};
use crate::domain::entities::SectionRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(FromRow)]
struct SectionRow {
    id: Uuid,
    tenant_id: Uuid,
    kind: String,
    order_index: i32,
    content_json: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SectionRow> for SectionRecord {
    fn from(row: SectionRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            kind: row.kind,
            order_index: row.order_index,
            content_json: row.content_json,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SectionsRepo for PostgresRepositories {
    async fn list_sections_ordered(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<SectionRecord>, RepoError> {
        // Ties on order_index deliberately fall back to storage order.
        let rows = sqlx::query_as::<_, SectionRow>(
            r#"
            SELECT id, tenant_id, kind, order_index, content_json, created_at, updated_at
            FROM sections
            WHERE tenant_id = $1
            ORDER BY order_index ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SectionRecord::from).collect())
    }
}
