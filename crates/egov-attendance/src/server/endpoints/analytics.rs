//! Admin analytics endpoint.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub token: Option<String>,
}

/// GET /api/analytics?token=...
///
/// Returns the usage summary, guarded by the configured shared secret.
pub async fn get_analytics(
    State(s): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> Response {
    let Some(secret) = &s.config.analytics_secret else {
        return ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "ANALYTICS_SECRET not configured on server.",
        ))
        .into_response();
    };

    if params.token.as_deref() != Some(secret.as_str()) {
        return ApiErrorType::from((
            StatusCode::UNAUTHORIZED,
            "Unauthorized. Provide ?token=YOUR_SECRET",
        ))
        .into_response();
    }

    match s.analytics.summary() {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": summary })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build analytics summary");
            ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load analytics.",
            ))
            .into_response()
        }
    }
}
