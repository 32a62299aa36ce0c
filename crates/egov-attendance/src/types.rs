/// Shared application state
use crate::analytics::AnalyticsStore;
use crate::calc::Thresholds;
use crate::config::AppConfig;
use crate::portal::PortalClient;
use std::sync::Arc;

/// State handed to every request handler.
pub struct AppState {
    /// Client for the eGovernance portal; holds no per-user state
    pub portal: PortalClient,
    /// Access log, written off the critical path
    pub analytics: Arc<AnalyticsStore>,
    /// Attendance policy ratios
    pub thresholds: Thresholds,
    pub config: AppConfig,
}
