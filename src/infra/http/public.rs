use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::domain::invite::InviteModel;

use super::AppState;
use super::error::ApiError;

/// Public read path: the cached invitation view for a slug.
///
/// Unknown slugs and unpublished tenants get the same generic not-found;
/// the public surface never reveals that a draft exists.
pub async fn invite_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<InviteModel>, ApiError> {
    match state.invites.get(&slug).await {
        Ok(Some(model)) => Ok(Json(model)),
        Ok(None) => Err(ApiError::not_found("Invitation not found")),
        Err(err) => {
            error!(
                target: "invito::http",
                slug,
                error = %err,
                "Invite lookup failed"
            );
            Err(ApiError::unavailable())
        }
    }
}

pub async fn healthz(State(state): State<AppState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!(target: "invito::http", error = %err, "Database health check failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
