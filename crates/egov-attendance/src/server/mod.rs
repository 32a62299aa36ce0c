use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::server::endpoints::{analytics, attendance, status};
use crate::types::AppState;

mod endpoints;
mod types;

/// Creates the API router.
///
/// # Parameters
/// - `app_state`: The shared app state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/attendance", post(attendance::post_attendance))
        .route("/api/health", get(status::get_health))
        .route("/api/analytics", get(analytics::get_analytics))
        .with_state(app_state)
}
