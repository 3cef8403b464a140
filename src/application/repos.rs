//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{RsvpRecord, SectionRecord, TenantRecord};
use crate::domain::types::Attendance;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewRsvp {
    pub tenant_id: Uuid,
    pub guest_name: String,
    pub contact: String,
    pub attending: Attendance,
    pub pax_count: i32,
    pub message: Option<String>,
}

/// Authoritative tenant lookups for the public surface.
///
/// Only published tenants are ever returned; a draft tenant is
/// indistinguishable from one that does not exist.
#[async_trait]
pub trait TenantsRepo: Send + Sync {
    async fn find_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<TenantRecord>, RepoError>;
}

#[async_trait]
pub trait SectionsRepo: Send + Sync {
    /// List a tenant's sections ordered by `order_index` ascending.
    async fn list_sections_ordered(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<SectionRecord>, RepoError>;
}

#[async_trait]
pub trait RsvpsRepo: Send + Sync {
    async fn append_submission(&self, rsvp: NewRsvp) -> Result<RsvpRecord, RepoError>;
}
