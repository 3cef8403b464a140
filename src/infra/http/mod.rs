//! HTTP surface: the public read path and the guarded RSVP write path.

mod error;
mod public;
mod rsvp;

pub use error::ApiError;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::application::invite::InviteCache;
use crate::application::rsvp::RsvpService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct AppState {
    pub invites: Arc<InviteCache>,
    pub rsvps: Arc<RsvpService>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/invites/{slug}", get(public::invite_detail))
        .route("/rsvp", post(rsvp::submit_rsvp))
        .route("/healthz", get(public::healthz))
        .with_state(state)
}
