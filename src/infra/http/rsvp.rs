use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::application::rsvp::{RsvpError, RsvpSubmission};

use super::AppState;
use super::error::ApiError;

#[derive(Debug, Serialize)]
struct RsvpAccepted {
    status: &'static str,
}

pub async fn submit_rsvp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<RsvpSubmission>,
) -> Response {
    let caller_ip = client_ip(&headers);

    match state.rsvps.submit(submission, &caller_ip).await {
        // Honeypot discards get the same envelope as real submissions.
        Ok(_) => Json(RsvpAccepted { status: "ok" }).into_response(),
        Err(RsvpError::Invalid(issues)) => ApiError::invalid_submission(issues).into_response(),
        Err(RsvpError::RateLimited { retry_after }) => ApiError::rate_limited(retry_after),
        Err(RsvpError::NotFound) => ApiError::not_found("Invitation not found").into_response(),
        Err(err) => {
            error!(target: "invito::http", error = %err, "RSVP submission failed");
            ApiError::unavailable().into_response()
        }
    }
}

/// Caller network identity for rate limiting.
///
/// The service is expected to sit behind a reverse proxy that sets
/// `X-Forwarded-For`; the first hop is the client. Without the header every
/// caller shares the `unknown` bucket, which throttles aggressively rather
/// than not at all.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn first_forwarded_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn missing_header_falls_back_to_unknown() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn empty_header_falls_back_to_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_ip(&headers), "unknown");
    }
}
