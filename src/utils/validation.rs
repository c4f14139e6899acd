use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._]{1,30}$").expect("valid username regex"));

/// Instagram usernames: 1-30 letters, digits, dots or underscores.
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn validate_username(username: &str) -> Result<&str, AppError> {
    if is_valid_username(username) {
        Ok(username)
    } else {
        Err(AppError::InvalidUsername(username.to_string()))
    }
}
