/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 19/10/26
 ******************************************************************************/
use reqwest::StatusCode;
use std::fmt::{Display, Formatter};
use std::{fmt, io};

/// Failures of the credential login flow.
#[derive(Debug)]
pub enum AuthError {
    Network(reqwest::Error),
    Io(io::Error),
    Json(serde_json::Error),
    BadCredentials,
    TwoFactorRequired,
    ChallengeRequired,
    Other(String),
    Unexpected(StatusCode),
}

impl AuthError {
    /// Login cannot succeed without a human in the loop.
    pub fn needs_manual_intervention(&self) -> bool {
        matches!(self, AuthError::TwoFactorRequired | AuthError::ChallengeRequired)
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(e) => write!(f, "network error: {e}"),
            AuthError::Io(e) => write!(f, "io error: {e}"),
            AuthError::Json(e) => write!(f, "json error: {e}"),
            AuthError::BadCredentials => write!(f, "bad credentials"),
            AuthError::TwoFactorRequired => write!(f, "two-factor authentication required"),
            AuthError::ChallengeRequired => write!(f, "login challenge required"),
            AuthError::Other(msg) => write!(f, "other error: {msg}"),
            AuthError::Unexpected(s) => write!(f, "unexpected http status: {s}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e)
    }
}
impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::Io(e)
    }
}
impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Json(e)
    }
}
impl From<AppError> for AuthError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Network(e) => AuthError::Network(e),
            AppError::Io(e) => AuthError::Io(e),
            AppError::Upstream(s) => AuthError::Unexpected(s),
            AppError::RateLimited => AuthError::Unexpected(StatusCode::TOO_MANY_REQUESTS),
            other => AuthError::Other(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    PrivateAccount(String),
    RateLimited,
    Upstream(StatusCode),
    MalformedResponse(String),
    SessionMissing,
    Timeout,
    InvalidUsername(String),
    InvalidMediaUrl(String),
    Network(reqwest::Error),
    Io(io::Error),
}

impl AppError {
    /// True for every failure attributed to the upstream service itself.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Upstream(_) | AppError::MalformedResponse(_))
    }

    /// Status code used when the error crosses an HTTP request boundary.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PrivateAccount(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) | AppError::MalformedResponse(_) | AppError::Network(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::SessionMissing => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::InvalidUsername(_) | AppError::InvalidMediaUrl(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(username) => format!("User '{username}' was not found."),
            AppError::PrivateAccount(username) => format!("'{username}' is a private account."),
            AppError::RateLimited => {
                "Instagram rate limit reached. Please retry in a few minutes.".to_string()
            }
            AppError::Upstream(status) => format!("Instagram API error (HTTP {})", status.as_u16()),
            AppError::MalformedResponse(_) => {
                "Instagram returned an unreadable response.".to_string()
            }
            AppError::SessionMissing => {
                "No Instagram session is loaded. Provision a session first.".to_string()
            }
            AppError::Timeout => "Instagram did not respond in time.".to_string(),
            AppError::InvalidUsername(_) => "Invalid username format.".to_string(),
            AppError::InvalidMediaUrl(reason) => format!("Invalid media URL: {reason}"),
            AppError::Network(_) => "Could not reach Instagram.".to_string(),
            AppError::Io(_) => "Internal storage error.".to_string(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(u) => write!(f, "not found: {u}"),
            AppError::PrivateAccount(u) => write!(f, "private account: {u}"),
            AppError::RateLimited => write!(f, "rate limit exceeded"),
            AppError::Upstream(s) => write!(f, "upstream error: {s}"),
            AppError::MalformedResponse(s) => write!(f, "malformed upstream response: {s}"),
            AppError::SessionMissing => write!(f, "no session loaded"),
            AppError::Timeout => write!(f, "request timed out"),
            AppError::InvalidUsername(u) => write!(f, "invalid username: {u}"),
            AppError::InvalidMediaUrl(s) => write!(f, "invalid media url: {s}"),
            AppError::Network(e) => write!(f, "network error: {e}"),
            AppError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout
        } else if e.is_decode() {
            AppError::MalformedResponse(e.to_string())
        } else {
            AppError::Network(e)
        }
    }
}
impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e)
    }
}
impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::MalformedResponse(e.to_string())
    }
}
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Network(e) => AppError::from(e),
            AuthError::Io(e) => AppError::Io(e),
            AuthError::Json(e) => AppError::from(e),
            AuthError::Unexpected(s) => AppError::Upstream(s),
            _ => AppError::Upstream(StatusCode::UNAUTHORIZED),
        }
    }
}
