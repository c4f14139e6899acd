use crate::application::models::payload::RawMediaItem;
use crate::constants::CAROUSEL_MEDIA_TYPE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One downloadable media unit: a story, a single post or one carousel slide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub media_type: MediaKind,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_total: Option<usize>,
}

/// Video items play the video and show the first image as thumbnail;
/// image items use the first image and carry no thumbnail.
fn pick_urls(raw: &RawMediaItem) -> (MediaKind, String, Option<String>) {
    match raw.first_video() {
        Some(video) => (
            MediaKind::Video,
            video.to_string(),
            raw.first_image().map(String::from),
        ),
        None => (
            MediaKind::Image,
            raw.first_image().unwrap_or_default().to_string(),
            None,
        ),
    }
}

fn timestamp(taken_at: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(taken_at, 0).unwrap_or_default()
}

impl MediaItem {
    fn base(raw: &RawMediaItem, id: String, username: &str, taken_at: DateTime<Utc>) -> Self {
        let (media_type, url, thumbnail_url) = pick_urls(raw);
        Self {
            id,
            post_id: None,
            media_type,
            url,
            thumbnail_url,
            timestamp: taken_at,
            username: username.to_string(),
            caption: None,
            like_count: None,
            carousel_index: None,
            carousel_total: None,
        }
    }

    /// Maps a story item.
    pub fn from_story(raw: &RawMediaItem, username: &str) -> Self {
        Self::base(raw, raw.pk.clone(), username, timestamp(raw.taken_at))
    }

    /// Maps a feed post, expanding carousels into one item per slide.
    pub fn from_post(raw: &RawMediaItem, username: &str) -> Vec<Self> {
        let taken_at = timestamp(raw.taken_at);
        let caption = raw.caption.as_ref().map(|c| c.text.clone()).unwrap_or_default();
        let like_count = raw.like_count.unwrap_or_default();

        let with_post = |mut item: MediaItem| {
            item.post_id = Some(raw.pk.clone());
            item.caption = Some(caption.clone());
            item.like_count = Some(like_count);
            item
        };

        if raw.media_type == Some(CAROUSEL_MEDIA_TYPE) {
            let total = raw.carousel_media.len();
            raw.carousel_media
                .iter()
                .enumerate()
                .map(|(i, slide)| {
                    let mut item = with_post(Self::base(
                        slide,
                        format!("{}_{}", raw.pk, i),
                        username,
                        taken_at,
                    ));
                    item.carousel_index = Some(i);
                    item.carousel_total = Some(total);
                    item
                })
                .collect()
        } else {
            vec![with_post(Self::base(raw, raw.pk.clone(), username, taken_at))]
        }
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaKind::Video
    }
}
