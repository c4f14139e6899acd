use crate::constants::{
    DEFAULT_API_TIMEOUT, DEFAULT_BASE_URL, DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_MAX_POSTS,
    DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE, DEFAULT_POSTS_REQUESTED,
};
use crate::storage::config::StorageConfig;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::error;

#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub credentials: Option<Credentials>,
    pub rest_api: RestApiConfig,
    pub storage: StorageConfig,
    pub keepalive: KeepaliveConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestApiConfig {
    pub base_url: String,
    /// Per-call timeout in seconds.
    pub timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeepaliveConfig {
    /// Seconds between pings.
    pub interval: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    pub page_size: usize,
    pub page_delay_ms: u64,
    pub default_posts: usize,
    pub max_posts: usize,
    pub private_policy: PrivateAccountPolicy,
}

/// Which private accounts the fetchers are allowed to read.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivateAccountPolicy {
    /// Every private account is refused.
    #[default]
    RejectAll,
    /// Private accounts the session account follows are readable.
    AllowFollowed,
}

impl FromStr for PrivateAccountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject_all" | "reject" => Ok(PrivateAccountPolicy::RejectAll),
            "allow_followed" | "followed" => Ok(PrivateAccountPolicy::AllowFollowed),
            other => Err(format!("unknown private account policy: {other}")),
        }
    }
}

impl fmt::Display for PrivateAccountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateAccountPolicy::RejectAll => write!(f, "reject_all"),
            PrivateAccountPolicy::AllowFollowed => write!(f, "allow_followed"),
        }
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"username\":\"{}\",\"password\":\"[REDACTED]\"}}",
            self.username
        )
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credentials = self
            .credentials
            .as_ref()
            .map_or("null".to_string(), |c| c.to_string());
        write!(
            f,
            "{{\"credentials\":{},\"rest_api\":{},\"storage\":{},\"keepalive\":{},\"fetch\":{}}}",
            credentials, self.rest_api, self.storage, self.keepalive, self.fetch
        )
    }
}

impl fmt::Display for RestApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"timeout\":{}}}",
            self.base_url, self.timeout
        )
    }
}

impl fmt::Display for KeepaliveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"interval\":{}}}", self.interval)
    }
}

impl fmt::Display for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"page_size\":{},\"page_delay_ms\":{},\"default_posts\":{},\
             \"max_posts\":{},\"private_policy\":\"{}\"}}",
            self.page_size,
            self.page_delay_ms,
            self.default_posts,
            self.max_posts,
            self.private_policy
        )
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

/// Credentials are only usable when both halves are present and non-blank.
fn credentials_from_env() -> Option<Credentials> {
    let username = get_env_or_default("IG_USERNAME", String::new());
    let password = get_env_or_default("IG_PASSWORD", String::new());
    let (username, password) = (username.trim(), password.trim());
    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        let session_key = get_env_or_default("IG_SESSION_KEY", String::new());
        Config {
            credentials: credentials_from_env(),
            rest_api: RestApiConfig {
                base_url: get_env_or_default("IG_BASE_URL", String::from(DEFAULT_BASE_URL)),
                timeout: get_env_or_default("IG_TIMEOUT", DEFAULT_API_TIMEOUT),
            },
            storage: StorageConfig {
                session_dir: get_env_or_default("IG_SESSION_DIR", PathBuf::from(".sessions")),
                encryption_key: (!session_key.trim().is_empty())
                    .then(|| session_key.trim().to_string()),
            },
            keepalive: KeepaliveConfig {
                interval: get_env_or_default("IG_KEEPALIVE_INTERVAL", DEFAULT_KEEPALIVE_INTERVAL),
            },
            fetch: FetchConfig {
                page_size: get_env_or_default("IG_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
                page_delay_ms: get_env_or_default("IG_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS),
                default_posts: DEFAULT_POSTS_REQUESTED,
                max_posts: get_env_or_default("IG_MAX_POSTS", DEFAULT_MAX_POSTS),
                private_policy: get_env_or_default(
                    "IG_PRIVATE_POLICY",
                    PrivateAccountPolicy::default(),
                ),
            },
        }
    }
}
