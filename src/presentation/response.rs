use crate::application::models::identity::Identity;
use crate::application::models::media::MediaItem;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public profile fields shown next to fetched media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub username: String,
    pub full_name: String,
    pub profile_pic_url: String,
    pub is_private: bool,
    pub followers: u64,
}

impl From<&Identity> for UserSummary {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            full_name: identity.full_name.clone(),
            profile_pic_url: identity.profile_pic_url.clone(),
            is_private: identity.is_private,
            followers: identity.followers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoriesResponse {
    pub user: UserSummary,
    pub stories: Vec<MediaItem>,
    pub count: usize,
}

impl StoriesResponse {
    pub fn new(identity: &Identity, stories: Vec<MediaItem>) -> Self {
        Self {
            user: identity.into(),
            count: stories.len(),
            stories,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostsResponse {
    pub user: UserSummary,
    pub posts: Vec<MediaItem>,
    pub count: usize,
}

impl PostsResponse {
    pub fn new(identity: &Identity, posts: Vec<MediaItem>) -> Self {
        Self {
            user: identity.into(),
            count: posts.len(),
            posts,
        }
    }
}

/// Error body returned across the request boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip)]
    pub status: u16,
}

impl From<&AppError> for ErrorBody {
    fn from(error: &AppError) -> Self {
        Self {
            detail: error.user_message(),
            status: error.http_status().as_u16(),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.detail)
    }
}
