//! Guest RSVP intake: validation, abuse throttling, persistence.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::kv::KvError;
use crate::application::rate_limit::RateLimiter;
use crate::application::repos::{NewRsvp, RepoError, RsvpsRepo, TenantsRepo};
use crate::domain::types::Attendance;

const METRIC_RSVP_RECORDED: &str = "invito_rsvp_recorded_total";
const METRIC_RSVP_DISCARDED: &str = "invito_rsvp_discarded_total";

/// Logical action name used in rate-limit bucket keys.
pub const RSVP_ACTION: &str = "rsvp";

pub const DEFAULT_RSVP_LIMIT: u32 = 5;
pub const DEFAULT_RSVP_WINDOW: Duration = Duration::from_secs(60);

const GUEST_NAME_MAX_CHARS: usize = 120;
const CONTACT_MIN_CHARS: usize = 3;
const CONTACT_MAX_CHARS: usize = 160;
const PAX_MIN: i32 = 1;
const PAX_MAX: i32 = 20;
const MESSAGE_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpSubmission {
    pub slug: String,
    pub guest_name: String,
    pub contact: String,
    pub attending: Attendance,
    #[serde(default = "default_pax_count")]
    pub pax_count: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub honeypot: Option<String>,
}

fn default_pax_count() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum RsvpError {
    #[error("submission failed validation")]
    Invalid(Vec<FieldIssue>),
    #[error("too many attempts")]
    RateLimited { retry_after: u64 },
    #[error("invitation not found")]
    NotFound,
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpOutcome {
    /// Submission persisted.
    Recorded,
    /// Honeypot tripped: answered as success, stored nowhere.
    Discarded,
}

pub struct RsvpService {
    limiter: Arc<RateLimiter>,
    tenants: Arc<dyn TenantsRepo>,
    rsvps: Arc<dyn RsvpsRepo>,
    limit: u32,
    window: Duration,
}

impl RsvpService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        tenants: Arc<dyn TenantsRepo>,
        rsvps: Arc<dyn RsvpsRepo>,
        limit: u32,
        window: Duration,
    ) -> Self {
        Self {
            limiter,
            tenants,
            rsvps,
            limit,
            window,
        }
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    /// Accept a submission from `caller_ip`.
    ///
    /// Order matters: the honeypot is evaluated before the rate limiter so
    /// trapped bots neither consume budget nor touch storage, and the
    /// limiter runs before the tenant lookup so a throttled caller cannot
    /// probe which slugs exist.
    pub async fn submit(
        &self,
        submission: RsvpSubmission,
        caller_ip: &str,
    ) -> Result<RsvpOutcome, RsvpError> {
        let issues = validate(&submission);
        if !issues.is_empty() {
            return Err(RsvpError::Invalid(issues));
        }

        if submission
            .honeypot
            .as_deref()
            .is_some_and(|value| !value.is_empty())
        {
            debug!(
                target: "invito::rsvp",
                slug = %submission.slug,
                "Discarding honeypot submission"
            );
            counter!(METRIC_RSVP_DISCARDED).increment(1);
            return Ok(RsvpOutcome::Discarded);
        }

        let bucket = format!("{RSVP_ACTION}:{}:{caller_ip}", submission.slug);
        let decision = self
            .limiter
            .check(&bucket, self.limit, self.window)
            .await?;
        if !decision.allowed {
            return Err(RsvpError::RateLimited {
                retry_after: self.retry_after_secs(),
            });
        }

        let Some(tenant) = self
            .tenants
            .find_published_by_slug(&submission.slug)
            .await?
        else {
            return Err(RsvpError::NotFound);
        };

        self.rsvps
            .append_submission(NewRsvp {
                tenant_id: tenant.id,
                guest_name: submission.guest_name,
                contact: submission.contact,
                attending: submission.attending,
                pax_count: submission.pax_count,
                message: submission.message,
            })
            .await?;

        counter!(METRIC_RSVP_RECORDED).increment(1);
        info!(
            target: "invito::rsvp",
            tenant = %tenant.slug,
            attending = submission.attending.as_str(),
            "Recorded RSVP"
        );
        Ok(RsvpOutcome::Recorded)
    }
}

fn validate(submission: &RsvpSubmission) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    if submission.slug.is_empty() {
        issues.push(FieldIssue {
            field: "slug",
            message: "must not be empty",
        });
    }

    let name_chars = submission.guest_name.chars().count();
    if name_chars == 0 || name_chars > GUEST_NAME_MAX_CHARS {
        issues.push(FieldIssue {
            field: "guest_name",
            message: "must be between 1 and 120 characters",
        });
    }

    let contact_chars = submission.contact.chars().count();
    if !(CONTACT_MIN_CHARS..=CONTACT_MAX_CHARS).contains(&contact_chars) {
        issues.push(FieldIssue {
            field: "contact",
            message: "must be between 3 and 160 characters",
        });
    }

    if !(PAX_MIN..=PAX_MAX).contains(&submission.pax_count) {
        issues.push(FieldIssue {
            field: "pax_count",
            message: "must be between 1 and 20",
        });
    }

    if submission
        .message
        .as_deref()
        .is_some_and(|message| message.chars().count() > MESSAGE_MAX_CHARS)
    {
        issues.push(FieldIssue {
            field: "message",
            message: "must be at most 1000 characters",
        });
    }

    issues
}
