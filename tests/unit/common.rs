use async_trait::async_trait;
use ig_media_client::application::services::instagram_service::InstagramService;
use ig_media_client::config::{
    Config, Credentials, FetchConfig, KeepaliveConfig, PrivateAccountPolicy, RestApiConfig,
};
use ig_media_client::error::AuthError;
use ig_media_client::session::interface::Authenticator;
use ig_media_client::session::session::Session;
use ig_media_client::storage::config::StorageConfig;
use ig_media_client::storage::session_store::SessionStore;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Authenticator handing out a fixed cookie set and counting logins.
pub struct CountingAuthenticator {
    cookies: Option<String>,
    pub logins: AtomicUsize,
}

impl CountingAuthenticator {
    pub fn issuing(cookies: &str) -> Arc<Self> {
        Arc::new(Self {
            cookies: Some(cookies.to_string()),
            logins: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            cookies: None,
            logins: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        match &self.cookies {
            Some(cookies) => Ok(Session::from_cookie_header(&credentials.username, cookies)),
            None => Err(AuthError::BadCredentials),
        }
    }
}

pub fn test_config(server_url: &str, session_dir: &Path, with_credentials: bool) -> Config {
    Config {
        credentials: with_credentials.then(|| Credentials {
            username: "viewer".to_string(),
            password: "secret".to_string(),
        }),
        rest_api: RestApiConfig {
            base_url: server_url.to_string(),
            timeout: 5,
        },
        storage: StorageConfig {
            session_dir: session_dir.to_path_buf(),
            encryption_key: None,
        },
        keepalive: KeepaliveConfig { interval: 3600 },
        fetch: FetchConfig {
            page_size: 12,
            page_delay_ms: 0,
            default_posts: 200,
            max_posts: 500,
            private_policy: PrivateAccountPolicy::RejectAll,
        },
    }
}

pub fn seed_session(config: &Config, cookies: &str) {
    let store = SessionStore::new(&config.storage).unwrap();
    store.save(&Session::from_cookie_header("viewer", cookies)).unwrap();
}

/// Service whose stored session is loaded and whose logins are counted.
pub async fn started_service(
    config: Config,
    authenticator: Arc<CountingAuthenticator>,
) -> InstagramService {
    let service = InstagramService::with_authenticator(config, authenticator).unwrap();
    assert!(service.start().await);
    service
}

pub const PROFILE_BODY: &str = r#"{"data": {"user": {
    "id": "42", "username": "natgeo", "full_name": "National Geographic",
    "profile_pic_url": "https://scontent.cdninstagram.com/p.jpg",
    "is_private": false, "followed_by_viewer": false,
    "edge_followed_by": {"count": 1000}}}, "status": "ok"}"#;
