/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

/// Instagram web application id, required by every `/api/v1` call.
pub(crate) const IG_APP_ID: &str = "936619743392459";
pub(crate) const APP_ID_HEADER: &str = "x-ig-app-id";
pub(crate) const CSRF_HEADER: &str = "x-csrftoken";
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub(crate) const DEFAULT_BASE_URL: &str = "https://www.instagram.com";
pub(crate) const API_PREFIX: &str = "/api/v1/";

pub(crate) const SESSION_COOKIE: &str = "sessionid";
pub(crate) const CSRF_COOKIE: &str = "csrftoken";
pub(crate) const SESSION_FILE_PREFIX: &str = "session-";
pub(crate) const ACTIVE_POINTER_FILE: &str = "ACTIVE";

/// Seconds.
pub(crate) const DEFAULT_API_TIMEOUT: u64 = 15;
pub(crate) const DEFAULT_KEEPALIVE_INTERVAL: u64 = 30 * 60;
pub(crate) const MEDIA_PROXY_TIMEOUT: u64 = 30;

pub(crate) const DEFAULT_PAGE_SIZE: usize = 12;
pub(crate) const DEFAULT_PAGE_DELAY_MS: u64 = 500;
pub(crate) const DEFAULT_POSTS_REQUESTED: usize = 200;
pub(crate) const DEFAULT_MAX_POSTS: usize = 500;

/// Upstream `media_type` value for carousel posts.
pub(crate) const CAROUSEL_MEDIA_TYPE: i64 = 8;

/// CDN domains the media proxy may fetch from, matched exactly or as a parent domain.
pub(crate) const ALLOWED_MEDIA_DOMAINS: [&str; 3] =
    ["cdninstagram.com", "fbcdn.net", "instagram.com"];
pub(crate) const MAX_MEDIA_REDIRECTS: usize = 5;
