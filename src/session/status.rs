use chrono::{DateTime, Utc};
use serde::Serialize;

/// What external callers may know about the loaded session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionStatus {
    pub logged_in: bool,
    pub username: Option<String>,
    pub has_sessionid: bool,
    /// Last time the session's cookies were set or merged.
    pub updated_at: Option<DateTime<Utc>>,
    pub needs_manual_refresh: bool,
    pub last_keepalive: Option<DateTime<Utc>>,
}

impl SessionStatus {
    pub fn logged_out(needs_manual_refresh: bool) -> Self {
        Self {
            logged_in: false,
            username: None,
            has_sessionid: false,
            updated_at: None,
            needs_manual_refresh,
            last_keepalive: None,
        }
    }
}
