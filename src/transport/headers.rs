/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 19/10/26
 ******************************************************************************/

use crate::constants::{APP_ID_HEADER, CSRF_HEADER, IG_APP_ID, USER_AGENT};
use crate::session::session::Session;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

/// Headers sent with every request: the web app id and a browser user agent.
pub(crate) fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(APP_ID_HEADER),
        HeaderValue::from_static(IG_APP_ID),
    );
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}

/// Per-request headers derived from the session: the cookie jar and, for
/// state-changing requests, the CSRF token plus a same-origin referer.
pub(crate) fn session_headers(
    session: &Session,
    state_changing: bool,
    base_url: &str,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = session.cookie_header() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.insert(header::COOKIE, value);
            }
            Err(e) => warn!("Session cookies are not a valid header value: {}", e),
        }
    }
    if state_changing {
        if let Some(token) = session.csrf_token() {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(CSRF_HEADER), value);
                }
                Err(e) => warn!("{} is not a valid header value: {}", CSRF_HEADER, e),
            }
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}/", base_url.trim_end_matches('/'))) {
            headers.insert(header::REFERER, value);
        }
    }
    headers
}
