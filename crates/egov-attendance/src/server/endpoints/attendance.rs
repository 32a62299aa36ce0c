//! The attendance endpoint: the full login -> fetch -> process chain.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::analytics;
use crate::calc;
use crate::portal::PortalError;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Request body; both fields fall back to the configured credentials.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttendanceRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /api/attendance
///
/// Runs one full scrape: fresh login, single attendance fetch, skip
/// calculations. Nothing is retried or cached; a failed call is simply
/// re-issued by the client.
pub async fn post_attendance(
    State(s): State<Arc<AppState>>,
    body: Option<Json<AttendanceRequest>>,
) -> Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let username = body
        .username
        .filter(|v| !v.trim().is_empty())
        .or_else(|| s.config.fallback_username.clone());
    let password = body
        .password
        .filter(|v| !v.is_empty())
        .or_else(|| s.config.fallback_password.clone());

    let (Some(username), Some(password)) = (username, password) else {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Username and password are required. Provide them in the request body or environment.",
        ))
        .into_response();
    };

    info!(username = %username, "POST /api/attendance - starting scrape");

    let session = match s.portal.login(&username, &password).await {
        Ok(session) => session,
        Err(e) => return portal_error_to_response(e),
    };

    let raw = match s.portal.fetch_attendance(session).await {
        Ok(raw) => raw,
        Err(e) => return portal_error_to_response(e),
    };

    let report = calc::process_attendance(&raw.data, &raw.semester, &s.thresholds);
    info!(
        subjects = report.subjects.len(),
        overall = report.overall.percentage,
        "Scrape complete"
    );

    // Fire-and-forget analytics: never awaited on the response path, and
    // its failures must not surface to the caller.
    let store = s.analytics.clone();
    tokio::spawn(async move {
        let Some(roll) = analytics::parse_roll_number(&username) else {
            return;
        };
        if let Err(e) = store.log_access(&roll) {
            warn!(error = %e, "Analytics logging failed");
        }
    });

    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": report })),
    )
        .into_response()
}

/// Maps each portal error kind to a distinct user-facing message. The
/// full error goes to the log only.
fn portal_error_to_response(error: PortalError) -> Response {
    let (status, message) = match &error {
        PortalError::MissingCredentials => {
            (StatusCode::BAD_REQUEST, "Username and password are required")
        }
        PortalError::UnreachablePortal { .. } => (
            StatusCode::BAD_GATEWAY,
            "Could not reach the eGovernance login page. The site may be down.",
        ),
        PortalError::AuthenticationFailed => (
            StatusCode::UNAUTHORIZED,
            "Login failed. Check your credentials.",
        ),
        PortalError::SessionExpired => (
            StatusCode::UNAUTHORIZED,
            "Session expired. Please try again.",
        ),
        PortalError::ResultsNotFound { .. } => (
            StatusCode::BAD_GATEWAY,
            "Attendance data not found. Try again.",
        ),
        PortalError::Network { .. } => (
            StatusCode::BAD_GATEWAY,
            "Network error while talking to the portal.",
        ),
        PortalError::UrlError { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    };

    error!(error = %error, "Attendance request failed");
    ApiErrorType::from((status, message)).into_response()
}
