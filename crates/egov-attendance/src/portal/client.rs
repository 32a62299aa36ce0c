//! HTTP client for the eGovernance portal.
//!
//! Handles the ASP.NET Web-Forms handshake:
//! 1. GET the login page, accumulate cookies, extract state tokens
//! 2. POST credentials as a partial postback (`X-MicrosoftAjax`)
//! 3. Follow the `pageRedirect||<url>` directive - this is what makes
//!    the server set the actual auth cookies
//! 4. GET the dashboard, extract fresh tokens (tokens are per-page)
//! 5. POST the "view attendance" control click, parse the delta

use super::error::PortalError;
use super::parse::parse_attendance_html;
use super::session::Session;
use super::tokens::extract_page_state;
use super::types::RawAttendance;
use rand::Rng;
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, COOKIE, ORIGIN, REFERER};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Base URL for the eGovernance portal. The :912 port redirects here.
const EGOV_BASE_URL: &str = "https://support.charusat.edu.in/egov";

/// Paths within the portal.
const LOGIN_POST_PATH: &str = "/Home.aspx";
const DASHBOARD_PATH: &str = "/frmAppSelection.aspx";

/// Page-content markers that confirm a logged-in state when the auth
/// cookie check is inconclusive.
const LOGGED_IN_MARKERS: [&str; 2] = ["lnkLogout", "Welcome"];

static PAGE_REDIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pageRedirect\|\|([^|]+)").unwrap());

/// Configuration for the portal client.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the portal
    pub base_url: String,
    /// User agent string
    pub user_agent: String,
    /// Connect timeout per request
    pub connect_timeout: Duration,
    /// Total timeout per request
    pub timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: EGOV_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36".to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the login handshake and attendance retrieval.
///
/// Holds no session state: every [`login`](PortalClient::login) starts an
/// empty [`Session`] and threads it through the calls, so concurrent
/// operations are fully independent.
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
    /// Origin header value derived from the base URL
    origin: String,
}

impl PortalClient {
    /// Creates a new client against the real portal.
    pub fn new() -> Result<Self, PortalError> {
        Self::with_config(PortalConfig::default())
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: PortalConfig) -> Result<Self, PortalError> {
        // The institutional server presents a misconfigured certificate,
        // so validation is disabled for this one client.
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::limited(10))
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortalError::Network {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let origin = Url::parse(&config.base_url)?.origin().ascii_serialization();

        Ok(Self {
            client,
            config,
            origin,
        })
    }

    /// Authenticates against the portal.
    ///
    /// # Returns
    /// * `Ok(Session)` - cookie jar usable for exactly one
    ///   [`fetch_attendance`](PortalClient::fetch_attendance)
    /// * `Err(PortalError)` - no retry is attempted; the whole chain must
    ///   be re-run by the caller
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, PortalError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(PortalError::MissingCredentials);
        }

        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, "Starting portal login");

        // Step 1: GET the login page
        let login_url = format!("{}/", self.config.base_url);
        let (session, html) = self
            .get(&login_url, Session::new())
            .await
            .map_err(|e| PortalError::UnreachablePortal {
                message: e.to_string(),
            })?;

        let state = extract_page_state(&html);
        if !state.has_viewstate() {
            return Err(PortalError::UnreachablePortal {
                message: "__VIEWSTATE missing from login page; the site may be down".to_string(),
            });
        }

        debug!(
            correlation_id = %correlation_id,
            cookies = session.len(),
            "Login page fetched, posting credentials"
        );

        // Step 2: POST credentials as an ASP.NET AJAX partial postback.
        // The hidden fields route the request to the login control and
        // must be reproduced exactly.
        let form: Vec<(&str, &str)> = vec![
            ("ScriptManager1", "up1|btnLogin"),
            ("__EVENTTARGET", "btnLogin"),
            ("__EVENTARGUMENT", ""),
            ("__LASTFOCUS", ""),
            ("__VIEWSTATE", state.viewstate()),
            ("__VIEWSTATEGENERATOR", state.viewstate_generator()),
            ("__EVENTVALIDATION", state.event_validation()),
            ("txtUserName", username),
            ("txtPassword", password),
            ("hdnGPLevel", ""),
            ("txtUserID", ""),
            ("txtName", ""),
            ("hdnPassword", ""),
            ("txtAccountType", ""),
            ("txtEmail", ""),
            ("hdnPasswordFlg", "-1"),
            ("hdnAuthorizedPerson", ""),
            ("hdnUserType", ""),
            ("__ASYNCPOST", "true"),
        ];

        let post_url = format!("{}{}", self.config.base_url, LOGIN_POST_PATH);
        let (mut session, body) = self.post_form(&post_url, &login_url, session, &form).await?;

        // Step 3: the delta response embeds a redirect directive on
        // success; following it is what sets the auth cookies.
        if let Some(redirect) = extract_redirect_url(&body) {
            let target = Url::parse(&self.config.base_url)?.join(&redirect)?;
            info!(correlation_id = %correlation_id, url = %target, "Following login redirect");
            let (updated, _) = self.get(target.as_str(), session).await?;
            session = updated;
        } else {
            debug!(correlation_id = %correlation_id, "No pageRedirect in login response");
        }

        // Step 4: confirm authentication
        if session.has_auth_cookie() {
            info!(correlation_id = %correlation_id, "Auth cookies obtained");
            return Ok(session);
        }

        // Fallback: the cookies may have been set under another name;
        // probe the dashboard for logged-in markers.
        let dashboard_url = format!("{}{}", self.config.base_url, DASHBOARD_PATH);
        match self.get(&dashboard_url, session).await {
            Ok((session, body)) if LOGGED_IN_MARKERS.iter().any(|m| body.contains(m)) => {
                info!(correlation_id = %correlation_id, "Auth confirmed via page content");
                Ok(session)
            }
            Ok(_) => Err(PortalError::AuthenticationFailed),
            Err(e) => {
                warn!(correlation_id = %correlation_id, error = %e, "Auth probe failed");
                Err(PortalError::AuthenticationFailed)
            }
        }
    }

    /// Fetches and parses the attendance data for an authenticated
    /// session. Consumes the session: state tokens are single-use and the
    /// jar is not meant to outlive one fetch.
    pub async fn fetch_attendance(&self, session: Session) -> Result<RawAttendance, PortalError> {
        let correlation_id = generate_correlation_id();

        // Step 1: GET the dashboard for fresh per-page tokens
        let dashboard_url = format!("{}{}", self.config.base_url, DASHBOARD_PATH);
        let (session, html) = self.get(&dashboard_url, session).await?;

        let state = extract_page_state(&html);
        if !state.has_viewstate() {
            return Err(PortalError::SessionExpired);
        }

        debug!(correlation_id = %correlation_id, "Dashboard fetched, requesting attendance");

        // Step 2: POST the "view attendance" image-button click, with the
        // synthetic coordinates the control expects
        let form: Vec<(&str, &str)> = vec![
            ("ScriptManager1", "UpGrossAtt|grdGrossAtt$ctl01$lnkRequestViewTT"),
            ("__EVENTTARGET", ""),
            ("__EVENTARGUMENT", ""),
            ("__VIEWSTATE", state.viewstate()),
            ("__VIEWSTATEGENERATOR", state.viewstate_generator()),
            ("__EVENTVALIDATION", state.event_validation()),
            ("__ASYNCPOST", "true"),
            ("grdGrossAtt$ctl01$lnkRequestViewTT.x", "242"),
            ("grdGrossAtt$ctl01$lnkRequestViewTT.y", "80"),
        ];

        let (_, body) = self
            .post_form(&dashboard_url, &dashboard_url, session, &form)
            .await?;

        let raw = parse_attendance_html(&body)?;
        info!(
            correlation_id = %correlation_id,
            subjects = raw.data.len(),
            semester = %raw.semester,
            "Attendance fetched"
        );

        Ok(raw)
    }

    /// GET with the session's accumulated cookies; returns the updated
    /// session and the response body.
    async fn get(&self, url: &str, session: Session) -> Result<(Session, String), PortalError> {
        let mut request = self.client.get(url);
        if let Some(cookies) = session.cookie_header() {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await?;
        let session = session.with_response(response.headers());
        let body = response.text().await?;
        Ok((session, body))
    }

    /// Form-encoded partial-postback POST with the portal's required
    /// headers.
    async fn post_form(
        &self,
        url: &str,
        referer: &str,
        session: Session,
        form: &[(&str, &str)],
    ) -> Result<(Session, String), PortalError> {
        let mut request = self
            .client
            .post(url)
            .form(form)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=UTF-8")
            .header(ORIGIN, &self.origin)
            .header(REFERER, referer)
            .header("X-MicrosoftAjax", "Delta=true");

        if let Some(cookies) = session.cookie_header() {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await?;
        let session = session.with_response(response.headers());
        let body = response.text().await?;
        Ok((session, body))
    }
}

/// Extracts and decodes the `pageRedirect||<url>` directive from an
/// ASP.NET AJAX delta response, if present.
fn extract_redirect_url(body: &str) -> Option<String> {
    PAGE_REDIRECT_RE
        .captures(body)
        .map(|caps| percent_decode(&caps[1]))
}

/// Percent-decoding for the redirect URL (the server URL-encodes it into
/// the delta stream).
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            if let Ok(byte) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
