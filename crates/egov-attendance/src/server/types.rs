/// Shared response types for the API layer
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A JSON API error: `{"success": false, "error": "<message>"}` with the
/// given status. Messages are user-facing; portal internals stay in the
/// logs.
pub struct ApiErrorType {
    pub status: StatusCode,
    pub message: String,
}

impl From<(StatusCode, &str)> for ApiErrorType {
    fn from((status, message): (StatusCode, &str)) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}
