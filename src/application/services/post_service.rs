use crate::application::models::identity::Identity;
use crate::application::models::media::MediaItem;
use crate::application::models::payload::UserFeedResponse;
use crate::application::services::resolver::Resolver;
use crate::config::FetchConfig;
use crate::error::AppError;
use crate::transport::api_client::ApiClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Feed posts of an account, newest first.
#[async_trait]
pub trait PostService: Send + Sync {
    /// Returns at most `requested` media items. Carousel posts count once per slide.
    async fn get_posts(
        &self,
        username: &str,
        requested: usize,
    ) -> Result<(Identity, Vec<MediaItem>), AppError>;
}

pub struct PostServiceImpl {
    api: Arc<ApiClient>,
    resolver: Arc<Resolver>,
    config: FetchConfig,
}

impl PostServiceImpl {
    pub fn new(api: Arc<ApiClient>, resolver: Arc<Resolver>, config: FetchConfig) -> Self {
        Self {
            api,
            resolver,
            config,
        }
    }

    /// Upper bound on feed pages for a request of `requested` items.
    pub fn max_pages(&self, requested: usize) -> usize {
        requested.div_ceil(self.config.page_size.max(1))
    }

    async fn collect_feed(
        &self,
        identity: &Identity,
        requested: usize,
    ) -> Result<Vec<MediaItem>, AppError> {
        let path = format!("feed/user/{}/", identity.id);
        let count = self.config.page_size.max(1).to_string();
        let max_pages = self.max_pages(requested);

        let mut posts = Vec::new();
        let mut max_id: Option<String> = None;
        let mut pages = 0;

        while posts.len() < requested && pages < max_pages {
            if pages > 0 && self.config.page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
            }

            let mut params = vec![("count", count.as_str())];
            if let Some(cursor) = max_id.as_deref() {
                params.push(("max_id", cursor));
            }
            let page: UserFeedResponse = match self.api.get_json(&path, &params).await {
                Ok(page) => page,
                Err(e) if pages == 0 => return Err(e),
                Err(e) => {
                    warn!("Post pagination stopped after {} pages: {}", pages, e);
                    break;
                }
            };
            pages += 1;

            if page.items.is_empty() {
                break;
            }
            for item in &page.items {
                posts.extend(MediaItem::from_post(item, &identity.username));
            }
            debug!("Page {} brought the total to {} items", pages, posts.len());

            if !page.more_available {
                break;
            }
            match page.next_max_id {
                Some(cursor) if !cursor.is_empty() => max_id = Some(cursor),
                _ => break,
            }
        }

        posts.truncate(requested);
        Ok(posts)
    }
}

#[async_trait]
impl PostService for PostServiceImpl {
    #[instrument(skip(self))]
    async fn get_posts(
        &self,
        username: &str,
        requested: usize,
    ) -> Result<(Identity, Vec<MediaItem>), AppError> {
        let mut identity = self.resolver.resolve(username).await?;
        identity.ensure_visible(self.config.private_policy)?;
        self.resolver.enrich(&mut identity).await;

        let posts = self.collect_feed(&identity, requested).await?;
        info!("Fetched {} post items for {}", posts.len(), identity.username);
        Ok((identity, posts))
    }
}
