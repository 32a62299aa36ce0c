//! Portal session client.
//!
//! Authenticates against the eGovernance Web-Forms portal and retrieves
//! the raw attendance rows. The flow is strictly sequential: login ->
//! fetch -> parse; nothing is cached or persisted, and every invocation
//! builds its own [`Session`].

mod client;
mod error;
mod parse;
mod session;
mod tokens;
mod types;

pub use client::{PortalClient, PortalConfig};
pub use error::PortalError;
pub use session::Session;
pub use tokens::{extract_page_state, PageState};
pub use types::{ClassType, RawAttendance, SubjectRecord};
