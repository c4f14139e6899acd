use crate::application::models::payload::{SearchUser, UserInfo, WebProfileUser};
use crate::config::PrivateAccountPolicy;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved upstream account. Lives for the duration of one fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub full_name: String,
    pub profile_pic_url: String,
    pub is_private: bool,
    pub followers: u64,
    /// Whether the session account follows this one.
    pub followed_by_viewer: bool,
    pub media_count: Option<u64>,
}

fn parse_id(raw: &str) -> Result<u64, AppError> {
    raw.parse()
        .map_err(|_| AppError::MalformedResponse(format!("non-numeric user id: {raw:?}")))
}

impl Identity {
    /// Identity known only by id, as the page scrape yields it.
    pub fn bare(id: u64, username: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            full_name: String::new(),
            profile_pic_url: String::new(),
            is_private: false,
            followers: 0,
            followed_by_viewer: false,
            media_count: None,
        }
    }

    pub fn from_profile(user: WebProfileUser) -> Result<Self, AppError> {
        Ok(Self {
            id: parse_id(&user.id)?,
            profile_pic_url: user.profile_pic_url_hd.unwrap_or(user.profile_pic_url),
            followers: user.edge_followed_by.map(|e| e.count).unwrap_or_default(),
            media_count: user.edge_owner_to_timeline_media.map(|e| e.count),
            username: user.username,
            full_name: user.full_name,
            is_private: user.is_private,
            followed_by_viewer: user.followed_by_viewer,
        })
    }

    pub fn from_search(user: SearchUser) -> Result<Self, AppError> {
        Ok(Self {
            id: parse_id(&user.pk)?,
            username: user.username,
            full_name: user.full_name,
            profile_pic_url: user.profile_pic_url,
            is_private: user.is_private,
            followers: user.follower_count.unwrap_or_default(),
            followed_by_viewer: user.friendship_status.is_some_and(|f| f.following),
            media_count: None,
        })
    }

    /// Fills counts and any missing display fields from `users/<id>/info/`.
    pub fn enrich(&mut self, info: UserInfo) {
        self.followers = info.follower_count;
        self.media_count = Some(info.media_count);
        self.fill_display(&info.full_name, &info.profile_pic_url);
    }

    /// Fails with `PrivateAccount` when `policy` does not allow reading this account.
    pub fn ensure_visible(&self, policy: PrivateAccountPolicy) -> Result<(), AppError> {
        let visible = match policy {
            PrivateAccountPolicy::RejectAll => !self.is_private,
            PrivateAccountPolicy::AllowFollowed => !self.is_private || self.followed_by_viewer,
        };
        if visible {
            Ok(())
        } else {
            Err(AppError::PrivateAccount(self.username.clone()))
        }
    }

    /// Sets name and avatar only where they are still empty.
    pub fn fill_display(&mut self, full_name: &str, profile_pic_url: &str) {
        if self.full_name.is_empty() {
            self.full_name = full_name.to_string();
        }
        if self.profile_pic_url.is_empty() {
            self.profile_pic_url = profile_pic_url.to_string();
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}
