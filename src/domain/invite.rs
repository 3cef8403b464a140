//! Denormalized public invitation view assembled from a tenant and its
//! content sections.
//!
//! This is the shape that gets cached: it must round-trip through JSON, and
//! assembling it must never fail on account of a single malformed section.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::entities::{SectionRecord, TenantRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteModel {
    pub tenant: InviteTenant,
    pub sections: Vec<InviteSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteTenant {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub display_name: String,
    pub event_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteSection {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub order_index: i32,
    pub content: Map<String, Value>,
}

impl InviteModel {
    /// Assemble the public view from storage records.
    ///
    /// Sections come out sorted by `order_index` ascending no matter how the
    /// source produced them; equal indexes keep their incoming order.
    pub fn assemble(tenant: TenantRecord, sections: Vec<SectionRecord>) -> Self {
        let mut sections: Vec<InviteSection> =
            sections.into_iter().map(InviteSection::from).collect();
        sections.sort_by_key(|section| section.order_index);

        Self {
            tenant: InviteTenant {
                id: tenant.id,
                title: tenant.title,
                slug: tenant.slug,
                display_name: tenant.display_name,
                event_date: tenant.event_date,
            },
            sections,
        }
    }
}

impl From<SectionRecord> for InviteSection {
    fn from(record: SectionRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            order_index: record.order_index,
            content: parse_content(&record.content_json),
        }
    }
}

/// Parse a stored content document, tolerating malformed input.
///
/// Anything that is not a JSON object (including unparseable text) becomes an
/// empty document; one broken section must not take down the whole page.
pub(crate) fn parse_content(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
