/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 19/10/26
 ******************************************************************************/
//! Upstream JSON payloads, deserialized leniently: every field the API may
//! omit carries a default.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Instagram sends primary keys as numbers in some payloads and strings in others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pk {
        Str(String),
        Num(u64),
    }

    Ok(match Option::<Pk>::deserialize(deserializer)? {
        Some(Pk::Str(s)) => s,
        Some(Pk::Num(n)) => n.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgeCount {
    #[serde(default)]
    pub count: u64,
}

/// `users/web_profile_info/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebProfileInfoResponse {
    #[serde(default)]
    pub data: Option<WebProfileData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebProfileData {
    #[serde(default)]
    pub user: Option<WebProfileUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebProfileUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_pic_url: String,
    #[serde(default)]
    pub profile_pic_url_hd: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub followed_by_viewer: bool,
    #[serde(default)]
    pub edge_followed_by: Option<EdgeCount>,
    #[serde(default)]
    pub edge_owner_to_timeline_media: Option<EdgeCount>,
}

/// `web/search/topsearch/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopSearchResponse {
    #[serde(default)]
    pub users: Vec<TopSearchEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopSearchEntry {
    #[serde(default)]
    pub user: Option<SearchUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendshipStatus {
    #[serde(default)]
    pub following: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchUser {
    #[serde(deserialize_with = "string_or_number")]
    pub pk: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_pic_url: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub friendship_status: Option<FriendshipStatus>,
}

/// `users/<id>/info/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default)]
    pub user: UserInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_pic_url: String,
}

/// `feed/reels_media/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReelsMediaResponse {
    #[serde(default)]
    pub reels: HashMap<String, Reel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reel {
    #[serde(default)]
    pub items: Vec<RawMediaItem>,
    #[serde(default)]
    pub user: Option<ReelUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReelUser {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_pic_url: String,
}

/// `feed/user/<id>/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFeedResponse {
    #[serde(default)]
    pub items: Vec<RawMediaItem>,
    #[serde(default)]
    pub more_available: bool,
    #[serde(default)]
    pub next_max_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaUrl {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageVersions {
    #[serde(default)]
    pub candidates: Vec<MediaUrl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub text: String,
}

/// A story item, a feed post or a carousel child.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMediaItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub pk: String,
    #[serde(default)]
    pub media_type: Option<i64>,
    #[serde(default)]
    pub taken_at: i64,
    #[serde(default)]
    pub video_versions: Vec<MediaUrl>,
    #[serde(default)]
    pub image_versions2: Option<ImageVersions>,
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub carousel_media: Vec<RawMediaItem>,
}

impl RawMediaItem {
    pub fn first_image(&self) -> Option<&str> {
        self.image_versions2
            .as_ref()
            .and_then(|v| v.candidates.first())
            .map(|c| c.url.as_str())
    }

    pub fn first_video(&self) -> Option<&str> {
        self.video_versions.first().map(|v| v.url.as_str())
    }
}
