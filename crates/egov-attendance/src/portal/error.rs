//! Error types for the portal session client.

use thiserror::Error;

/// Errors that can occur while talking to the eGovernance portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The login page could not be fetched, or it carried no `__VIEWSTATE`
    /// (the site is down or its markup changed)
    #[error("Could not reach the eGovernance login page: {message}")]
    UnreachablePortal { message: String },

    /// Credentials were rejected - no redirect and no logged-in markers
    #[error("Login failed. Could not obtain session cookies; check credentials.")]
    AuthenticationFailed,

    /// The post-login page no longer carries state tokens
    #[error("Session expired before attendance could be fetched")]
    SessionExpired,

    /// The attendance table was absent from the portal's response
    #[error("Attendance table not found in response: {message}")]
    ResultsNotFound { message: String },

    /// Username or password missing at the call boundary
    #[error("Username and password are required")]
    MissingCredentials,

    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },
}

impl PortalError {
    /// Returns true if this error means the caller must log in again.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            PortalError::AuthenticationFailed | PortalError::SessionExpired
        )
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for PortalError {
    fn from(err: url::ParseError) -> Self {
        PortalError::UrlError {
            message: err.to_string(),
        }
    }
}
