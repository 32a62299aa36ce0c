//! Explicit cookie-jar session state.
//!
//! The portal identifies a caller purely through cookies accumulated over
//! the login handshake. The jar is a plain value threaded through each
//! request rather than hidden client-side state, so one fetch operation
//! owns exactly one session and concurrent fetches share nothing.

use reqwest::header::{HeaderMap, SET_COOKIE};
use std::collections::BTreeMap;

/// Cookies seen by the portal are sufficient to prove authentication.
const AUTH_COOKIES: [&str; 2] = [".EGovWebApp", "ASP.NET_SessionId"];

/// Server-assigned identity state: cookie name -> value, accumulated
/// across every response in one login/fetch chain.
#[derive(Debug, Clone, Default)]
pub struct Session {
    cookies: BTreeMap<String, String>,
}

impl Session {
    /// Creates an empty session, as at the start of a login.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new session extended with every `Set-Cookie` in the
    /// given response headers. Later values win over earlier ones.
    pub fn with_response(mut self, headers: &HeaderMap) -> Self {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            // Only the name=value pair matters; attributes are dropped
            let name_value = raw.split(';').next().unwrap_or(raw);
            if let Some(eq) = name_value.find('=') {
                let name = name_value[..eq].trim();
                let val = name_value[eq + 1..].trim();
                if !name.is_empty() {
                    self.cookies.insert(name.to_string(), val.to_string());
                }
            }
        }
        self
    }

    /// Renders the full accumulated cookie set as a `Cookie` header
    /// value, or `None` when the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// True once a known authentication cookie has been set.
    pub fn has_auth_cookie(&self) -> bool {
        AUTH_COOKIES.iter().any(|name| self.cookies.contains_key(*name))
    }

    /// Number of cookies currently held (for logging).
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
