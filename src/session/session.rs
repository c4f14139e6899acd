/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/
use crate::constants::{CSRF_COOKIE, SESSION_COOKIE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Authenticated cookie set bound to one upstream account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    username: String,
    cookies: BTreeMap<String, String>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            cookies: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Builds a session from a browser `Cookie` header (`name=value; name2=value2`).
    pub fn from_cookie_header(username: &str, header: &str) -> Self {
        let mut session = Self::new(username);
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                session.set_cookie(name.trim(), value.trim());
            }
        }
        session
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn cookie_names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// An empty value removes the cookie.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        let value = value.trim_matches('"');
        if name.is_empty() {
            return;
        }
        if value.is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
        self.updated_at = Utc::now();
    }

    /// Applies raw `Set-Cookie` header values. Returns how many cookies changed.
    pub fn absorb_set_cookies<'a, I>(&mut self, headers: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut changed = 0;
        for header in headers {
            let mut parts = header.split(';');
            let Some((name, value)) = parts.next().and_then(|p| p.split_once('=')) else {
                continue;
            };
            let expired = parts.any(|attr| {
                let attr = attr.trim().to_ascii_lowercase();
                attr == "max-age=0" || attr.starts_with("max-age=-")
            });
            let value = if expired { "" } else { value.trim() };
            let name = name.trim();
            let incoming = Some(value.trim_matches('"')).filter(|v| !v.is_empty());
            if self.cookie(name) != incoming {
                debug!("Session cookie {} updated", name);
                self.set_cookie(name, value);
                changed += 1;
            }
        }
        changed
    }

    pub fn has_sessionid(&self) -> bool {
        self.cookie(SESSION_COOKIE).is_some_and(|v| !v.is_empty())
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.cookie(CSRF_COOKIE)
    }

    /// Value for the `Cookie` request header, `None` when the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cookies = self
            .cookies
            .keys()
            .map(|name| format!("\"{name}\":\"[REDACTED]\""))
            .collect::<Vec<_>>()
            .join(",");
        write!(
            f,
            "{{\"username\":\"{}\",\"cookies\":{{{}}},\"updated_at\":\"{}\"}}",
            self.username,
            cookies,
            self.updated_at.to_rfc3339()
        )
    }
}
