/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 19/10/26
 ******************************************************************************/
use crate::application::models::identity::Identity;
use crate::application::models::payload::{
    TopSearchResponse, UserInfoResponse, WebProfileInfoResponse,
};
use crate::error::AppError;
use crate::transport::api_client::{expect_ok, ApiClient};
use crate::transport::http_client::ApiRequest;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One way of turning a username into an [`Identity`].
///
/// `Ok(None)` means "no answer, try the next strategy". `Err(NotFound)` is
/// authoritative and stops the chain.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, username: &str) -> Result<Option<Identity>, AppError>;
}

/// Authenticated profile endpoint.
pub struct ProfileLookup {
    api: Arc<ApiClient>,
}

impl ProfileLookup {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResolveStrategy for ProfileLookup {
    fn name(&self) -> &'static str {
        "profile_lookup"
    }

    async fn resolve(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let request =
            ApiRequest::api(Method::GET, "users/web_profile_info/").query("username", username);
        let response = self.api.execute(&request).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(username.to_string()));
        }
        let body: WebProfileInfoResponse = expect_ok(response)?.json()?;
        match body.data.and_then(|d| d.user) {
            Some(user) => Identity::from_profile(user).map(Some),
            None => Err(AppError::NotFound(username.to_string())),
        }
    }
}

/// Search endpoint; only an exact (case-insensitive) username match counts.
pub struct TopSearch {
    api: Arc<ApiClient>,
}

impl TopSearch {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResolveStrategy for TopSearch {
    fn name(&self) -> &'static str {
        "top_search"
    }

    async fn resolve(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let body: TopSearchResponse = self
            .api
            .get_json("web/search/topsearch/", &[("query", username), ("count", "1")])
            .await?;

        let hit = body
            .users
            .into_iter()
            .filter_map(|entry| entry.user)
            .find(|user| user.username.eq_ignore_ascii_case(username));
        match hit {
            Some(user) => Identity::from_search(user).map(Some),
            None => {
                warn!("Search returned no match for '{}'", username);
                Ok(None)
            }
        }
    }
}

static PROFILE_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""profilePage_(\d+)""#).expect("valid profilePage regex"));
static USER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""user_id":"(\d+)""#).expect("valid user_id regex"));
static OG_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta property="og:title" content="([^"]*)""#).expect("valid og:title regex")
});
static PROFILE_PIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""profile_pic_url":"(https://[^"]+)""#).expect("valid profile_pic_url regex")
});

/// Scrapes the public profile page. Always reports a public account with no
/// follower count; enrichment fills the rest.
pub struct PageScrape {
    api: Arc<ApiClient>,
}

impl PageScrape {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn parse_profile_page(html: &str, username: &str) -> Option<Identity> {
        let id = PROFILE_PAGE_RE
            .captures(html)
            .or_else(|| USER_ID_RE.captures(html))
            .or_else(|| {
                let pattern = format!(r#""id":"(\d+)".*?"username":"{}""#, regex::escape(username));
                Regex::new(&pattern).ok().and_then(|re| re.captures(html))
            })
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())?;

        let mut identity = Identity::bare(id, username);
        identity.full_name = OG_TITLE_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().split('(').next().unwrap_or_default().trim().to_string())
            .unwrap_or_else(|| username.to_string());
        identity.profile_pic_url = PROFILE_PIC_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().replace("\\u0026", "&"))
            .unwrap_or_default();
        Some(identity)
    }
}

#[async_trait]
impl ResolveStrategy for PageScrape {
    fn name(&self) -> &'static str {
        "page_scrape"
    }

    async fn resolve(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let response = self.api.execute(&ApiRequest::get(&format!("/{username}/"))).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(username.to_string()));
        }
        let page = expect_ok(response)?;
        let identity = Self::parse_profile_page(&page.body, username);
        if let Some(identity) = &identity {
            info!("Resolved user via page scrape: {} -> {}", username, identity.id);
        }
        Ok(identity)
    }
}

/// Ordered chain of [`ResolveStrategy`]s.
pub struct Resolver {
    api: Arc<ApiClient>,
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl Resolver {
    pub fn new(api: Arc<ApiClient>, strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { api, strategies }
    }

    /// Profile lookup, then search, then page scrape.
    pub fn standard(api: Arc<ApiClient>) -> Self {
        let strategies: Vec<Box<dyn ResolveStrategy>> = vec![
            Box::new(ProfileLookup::new(api.clone())),
            Box::new(TopSearch::new(api.clone())),
            Box::new(PageScrape::new(api.clone())),
        ];
        Self::new(api, strategies)
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, username: &str) -> Result<Identity, AppError> {
        for strategy in &self.strategies {
            match strategy.resolve(username).await {
                Ok(Some(identity)) => {
                    debug!("{} resolved {}", strategy.name(), identity);
                    return Ok(identity);
                }
                Ok(None) => {}
                Err(e @ (AppError::NotFound(_) | AppError::SessionMissing)) => return Err(e),
                Err(e) => warn!("Resolver strategy {} failed: {}", strategy.name(), e),
            }
        }
        Err(AppError::NotFound(username.to_string()))
    }

    /// Fills follower and media counts when the resolving strategy left them
    /// out. Failures are only logged.
    pub async fn enrich(&self, identity: &mut Identity) {
        if identity.followers > 0 {
            return;
        }
        let path = format!("users/{}/info/", identity.id);
        match self.api.get_json::<UserInfoResponse>(&path, &[]).await {
            Ok(body) => identity.enrich(body.user),
            Err(e) => warn!("Failed to enrich user info for {}: {}", identity.username, e),
        }
    }
}
