use crate::application::models::identity::Identity;
use crate::application::models::media::MediaItem;
use crate::application::models::payload::ReelsMediaResponse;
use crate::application::services::resolver::Resolver;
use crate::config::PrivateAccountPolicy;
use crate::error::AppError;
use crate::transport::api_client::ApiClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Current stories of an account.
#[async_trait]
pub trait StoryService: Send + Sync {
    /// Resolves `username` and returns the enriched identity with its active stories.
    async fn get_stories(&self, username: &str) -> Result<(Identity, Vec<MediaItem>), AppError>;
}

pub struct StoryServiceImpl {
    api: Arc<ApiClient>,
    resolver: Arc<Resolver>,
    policy: PrivateAccountPolicy,
}

impl StoryServiceImpl {
    pub fn new(api: Arc<ApiClient>, resolver: Arc<Resolver>, policy: PrivateAccountPolicy) -> Self {
        Self {
            api,
            resolver,
            policy,
        }
    }
}

#[async_trait]
impl StoryService for StoryServiceImpl {
    #[instrument(skip(self))]
    async fn get_stories(&self, username: &str) -> Result<(Identity, Vec<MediaItem>), AppError> {
        let mut identity = self.resolver.resolve(username).await?;
        identity.ensure_visible(self.policy)?;

        let reel_id = identity.id.to_string();
        let reel_ids = serde_json::to_string(&[reel_id.as_str()])?;
        let mut body: ReelsMediaResponse = self
            .api
            .post_form("feed/reels_media/", &[("reel_ids", reel_ids.as_str())])
            .await?;

        let reel = body.reels.remove(&reel_id).unwrap_or_default();
        if let Some(user) = &reel.user {
            identity.fill_display(&user.full_name, &user.profile_pic_url);
        }
        debug!("Reel for {} holds {} items", identity, reel.items.len());

        self.resolver.enrich(&mut identity).await;
        let stories: Vec<MediaItem> = reel
            .items
            .iter()
            .map(|item| MediaItem::from_story(item, &identity.username))
            .collect();
        info!("Fetched {} stories for {}", stories.len(), identity.username);
        Ok((identity, stories))
    }
}
