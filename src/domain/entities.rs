//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{Attendance, TenantStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub display_name: String,
    pub event_date: String,
    pub status: TenantStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One ordered content block of a tenant's public page.
///
/// `content_json` is stored as raw text and parsed leniently when the public
/// view is assembled; a row with unparseable content still renders, with an
/// empty document in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: String,
    pub order_index: i32,
    pub content_json: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsvpRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub guest_name: String,
    pub contact: String,
    pub attending: Attendance,
    pub pax_count: i32,
    pub message: Option<String>,
    pub created_at: OffsetDateTime,
}
