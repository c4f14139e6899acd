/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 19/10/26
 ******************************************************************************/
use crate::application::services::media_proxy::{MediaProxy, ProxiedMedia};
use crate::application::services::post_service::{PostService, PostServiceImpl};
use crate::application::services::resolver::Resolver;
use crate::application::services::story_service::{StoryService, StoryServiceImpl};
use crate::config::Config;
use crate::error::AppError;
use crate::presentation::response::{PostsResponse, StoriesResponse};
use crate::session::auth::WebAuthenticator;
use crate::session::interface::Authenticator;
use crate::session::keepalive::{spawn_keepalive, KeepaliveHandle};
use crate::session::manager::SessionManager;
use crate::session::session::Session;
use crate::session::status::SessionStatus;
use crate::storage::session_store::SessionStore;
use crate::transport::api_client::ApiClient;
use crate::transport::http_client::IgHttpClient;
use crate::utils::validation::validate_username;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Entry point bundling the session, the resolver and the fetchers.
///
/// Operations validate their input and require a loaded session before any
/// network call is made.
pub struct InstagramService {
    config: Config,
    api: Arc<ApiClient>,
    stories: StoryServiceImpl,
    posts: PostServiceImpl,
    proxy: MediaProxy,
}

impl InstagramService {
    /// Builds the service with credential login against the configured base URL.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = IgHttpClient::new(&config.rest_api)?;
        let authenticator: Arc<dyn Authenticator> = Arc::new(WebAuthenticator::new(http));
        Self::with_authenticator(config, authenticator)
    }

    pub fn with_authenticator(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
    ) -> anyhow::Result<Self> {
        let store = SessionStore::new(&config.storage)?;
        let sessions = Arc::new(SessionManager::new(
            store,
            authenticator,
            config.credentials.clone(),
        ));
        let http = IgHttpClient::new(&config.rest_api)?;
        let api = Arc::new(ApiClient::new(http, sessions));
        let resolver = Arc::new(Resolver::standard(api.clone()));

        Ok(Self {
            stories: StoryServiceImpl::new(
                api.clone(),
                resolver.clone(),
                config.fetch.private_policy,
            ),
            posts: PostServiceImpl::new(api.clone(), resolver, config.fetch.clone()),
            proxy: MediaProxy::new()?,
            api,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        self.api.sessions()
    }

    /// Loads the stored session (or logs in). Returns whether one is loaded.
    pub async fn start(&self) -> bool {
        let loaded = self.sessions().load().await;
        let status = self.sessions().status().await;
        if loaded {
            info!(
                "Instagram session loaded: {} (sessionid: {})",
                status.username.unwrap_or_default(),
                if status.has_sessionid { "present" } else { "missing" }
            );
        } else {
            warn!(
                "No Instagram session found in {}",
                self.config.storage.session_dir.display()
            );
        }
        loaded
    }

    /// Persists an externally provisioned session and makes it the live one.
    pub async fn import_session(&self, session: Session) -> anyhow::Result<()> {
        self.sessions().activate(session).await
    }

    pub async fn session_status(&self) -> SessionStatus {
        self.sessions().status().await
    }

    async fn require_session(&self) -> Result<(), AppError> {
        if self.sessions().is_loaded().await {
            Ok(())
        } else {
            Err(AppError::SessionMissing)
        }
    }

    #[instrument(skip(self))]
    pub async fn get_stories(&self, username: &str) -> Result<StoriesResponse, AppError> {
        let username = validate_username(username)?;
        self.require_session().await?;
        let (identity, stories) = self.stories.get_stories(username).await?;
        Ok(StoriesResponse::new(&identity, stories))
    }

    /// `count` defaults to the configured request size and is capped at `max_posts`.
    #[instrument(skip(self))]
    pub async fn get_posts(
        &self,
        username: &str,
        count: Option<usize>,
    ) -> Result<PostsResponse, AppError> {
        let username = validate_username(username)?;
        self.require_session().await?;
        let requested = count
            .unwrap_or(self.config.fetch.default_posts)
            .min(self.config.fetch.max_posts);
        let (identity, posts) = self.posts.get_posts(username, requested).await?;
        Ok(PostsResponse::new(&identity, posts))
    }

    pub async fn proxy_media(&self, url: &str) -> Result<ProxiedMedia, AppError> {
        self.proxy.fetch(url).await
    }

    /// Starts the background keepalive at the configured interval.
    pub fn spawn_keepalive(&self) -> KeepaliveHandle {
        spawn_keepalive(
            self.api.clone(),
            Duration::from_secs(self.config.keepalive.interval.max(1)),
        )
    }
}
