//! Aggregate containers returned by the extraction client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::dates;
use super::entry::{ChannelInfo, HasHoverPreviews, PlaylistItem, SearchEntry};
use super::format::{Chapter, Format, LiveStatus};
use super::thumbnail::{HasThumbnails, Thumbnail};

/// Fixed channel tab paths, in display order.
pub const CHANNEL_TABS: [&str; 4] = ["featured", "videos", "shorts", "playlists"];

/// An ordered search result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Search {
    #[serde(alias = "original_url")]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub entries: Vec<SearchEntry>,
}

/// A playlist page with its metadata and entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    #[serde(alias = "original_url")]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(flatten)]
    pub channel: ChannelInfo,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "modified_date", deserialize_with = "dates::opt_date")]
    pub last_change: Option<DateTime<Utc>>,
    #[serde(default, alias = "view_count")]
    pub views: Option<u64>,
    #[serde(default, alias = "playlist_count")]
    pub total_entries: Option<u64>,
    #[serde(default)]
    pub entries: Vec<PlaylistItem>,
}

impl Playlist {
    /// Hover previews: reuse the 2nd-6th entries' thumbnails when the list
    /// is long enough, else the first entry's own preview grid.
    pub fn hover_srcsets(&self) -> Vec<String> {
        if self.entries.len() >= 3 {
            return self
                .entries
                .iter()
                .skip(1)
                .take(5)
                .map(|e| match e {
                    PlaylistItem::ShortEntry(s) => s.thumbnails_srcset(),
                    PlaylistItem::VideoEntry(v) => v.thumbnails_srcset(),
                    PlaylistItem::PartialEntry(p) => p.thumbnails_srcset(),
                })
                .collect();
        }
        match self.entries.first() {
            Some(PlaylistItem::ShortEntry(s)) => s.hover_srcsets(),
            Some(PlaylistItem::VideoEntry(v)) => v.hover_srcsets(),
            Some(PlaylistItem::PartialEntry(p)) => p.hover_srcsets(),
            None => Vec::new(),
        }
    }
}

impl HasThumbnails for Playlist {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }
}

/// A channel page: a search result set plus channel-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    #[serde(alias = "original_url")]
    pub url: String,
    #[serde(alias = "channel")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_tab", alias = "webpage_url_basename")]
    pub tab: String,
    #[serde(default, alias = "channel_follower_count")]
    pub followers: Option<u64>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub entries: Vec<SearchEntry>,
}

fn default_tab() -> String {
    "featured".to_owned()
}

impl Channel {
    /// Rewrite a channel URL to point at another tab. The default
    /// "featured" tab is expressed without a suffix.
    pub fn tab_url(from_url: &Url, to_tab: &str) -> Url {
        let mut path = from_url.path().trim_end_matches('/').to_owned();
        for tab in CHANNEL_TABS {
            if let Some(stripped) = path.strip_suffix(&format!("/{tab}")) {
                path = stripped.to_owned();
                break;
            }
        }
        path = format!("{path}/{to_tab}");
        if let Some(stripped) = path.strip_suffix("/featured") {
            path = stripped.to_owned();
        }

        let mut url = from_url.clone();
        url.set_path(&path);
        url
    }
}

impl HasThumbnails for Channel {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    fn has_banner(&self) -> bool {
        true
    }
}

/// A fully-extracted single video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(alias = "original_url")]
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(flatten)]
    pub channel: ChannelInfo,
    #[serde(default, alias = "view_count")]
    pub views: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "dates::opt_date")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::opt_date")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub live_status: Option<LiveStatus>,
    #[serde(default, alias = "release_timestamp", deserialize_with = "dates::opt_date")]
    pub live_release_date: Option<DateTime<Utc>>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    pub fps: f64,
    #[serde(default, alias = "like_count")]
    pub likes: Option<u64>,
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(default)]
    pub chapters: Option<Vec<Chapter>>,
}

impl Video {
    /// Same-origin manifest URL: a proxied upstream manifest when a
    /// non-DASH format provides one, otherwise the synthesized master.
    pub fn manifest_url(&self) -> String {
        for format in &self.formats {
            if let Some(manifest) = &format.manifest_url {
                if !format.has_dash() {
                    return format!("/proxy/get?url={}", urlencoding::encode(manifest));
                }
            }
        }
        format!(
            "/generate_hls/master?video_url={}",
            urlencoding::encode(&self.url)
        )
    }

    pub fn storyboard_url(&self) -> String {
        format!("/storyboard?video_url={}", urlencoding::encode(&self.url))
    }

    pub fn chapters_url(&self) -> String {
        format!("/chapters?video_url={}", urlencoding::encode(&self.url))
    }

    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or(self.upload_date)
    }

    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        self.live_release_date.or_else(|| self.uploaded_at())
    }
}

impl HasThumbnails for Video {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }
}

impl HasHoverPreviews for Video {
    fn preview_id(&self) -> &str {
        &self.id
    }
}
