/// Environment-driven application configuration
use anyhow::{Context, Result};
use std::env;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ANALYTICS_DB: &str = "analytics.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds to (`PORT`)
    pub port: u16,
    /// Portal base URL override (`EGOV_BASE_URL`), None for the default
    pub base_url: Option<String>,
    /// Path of the analytics SQLite database (`ANALYTICS_DB`)
    pub analytics_db: String,
    /// Shared secret guarding the analytics endpoint (`ANALYTICS_SECRET`)
    pub analytics_secret: Option<String>,
    /// Fallback credentials used when a request omits them
    /// (`EGOV_USERNAME` / `EGOV_PASSWORD`)
    pub fallback_username: Option<String>,
    pub fallback_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match optional("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            base_url: optional("EGOV_BASE_URL"),
            analytics_db: optional("ANALYTICS_DB")
                .unwrap_or_else(|| DEFAULT_ANALYTICS_DB.to_string()),
            analytics_secret: optional("ANALYTICS_SECRET"),
            fallback_username: optional("EGOV_USERNAME"),
            fallback_password: optional("EGOV_PASSWORD"),
        })
    }
}

/// Reads an environment variable, treating empty values as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
