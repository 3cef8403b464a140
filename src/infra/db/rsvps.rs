use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{NewRsvp, RepoError, RsvpsRepo};
use crate::domain::entities::RsvpRecord;
use crate::domain::types::Attendance;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(FromRow)]
struct RsvpRow {
    id: Uuid,
    tenant_id: Uuid,
    guest_name: String,
    contact: String,
    attending: Attendance,
    pax_count: i32,
    message: Option<String>,
    created_at: OffsetDateTime,
}

impl From<RsvpRow> for RsvpRecord {
    fn from(row: RsvpRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            guest_name: row.guest_name,
            contact: row.contact,
            attending: row.attending,
            pax_count: row.pax_count,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RsvpsRepo for PostgresRepositories {
    async fn append_submission(&self, rsvp: NewRsvp) -> Result<RsvpRecord, RepoError> {
        let row = sqlx::query_as::<_, RsvpRow>(
            r#"
            INSERT INTO rsvps (id, tenant_id, guest_name, contact, attending, pax_count, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, tenant_id, guest_name, contact, attending, pax_count, message, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(rsvp.tenant_id)
        .bind(&rsvp.guest_name)
        .bind(&rsvp.contact)
        .bind(rsvp.attending)
        .bind(rsvp.pax_count)
        .bind(rsvp.message.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(RsvpRecord::from(row))
    }
}
