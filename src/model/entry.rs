//! Entry variants produced by the classifier.
//!
//! Each variant is a struct composed from shared field groups
//! ([`EntryCommon`], [`ChannelInfo`]) by value; the container-scoped sums
//! [`SearchEntry`] and [`PlaylistItem`] are internally tagged by
//! `entry_type`, matching the discriminator the classifier writes into raw
//! records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates;
use super::format::LiveStatus;
use super::thumbnail::{HasThumbnails, Thumbnail};

/// Fields every concrete entry shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCommon {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// 1-based global ordinal inside a playlist, assigned at fetch time.
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

/// Channel-ownership field group, flattened into video-like entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default, alias = "channel")]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default, alias = "channel_follower_count")]
    pub channel_followers: Option<u64>,
    #[serde(default)]
    pub uploader_id: Option<String>,
    #[serde(default, alias = "uploader")]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
}

impl ChannelInfo {
    /// The shorter of the channel and uploader URLs (handle-style wins).
    pub fn shortest_channel_url(&self) -> Option<&str> {
        match (self.channel_url.as_deref(), self.uploader_url.as_deref()) {
            (Some(c), Some(u)) => Some(if u.len() < c.len() { u } else { c }),
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

/// Hover-preview capability: a fixed grid of platform preview images
/// derived from the video id.
pub trait HasHoverPreviews {
    fn preview_id(&self) -> &str;

    /// One srcset per preview frame, last frame first.
    fn hover_srcsets(&self) -> Vec<String> {
        let id = self.preview_id();
        (1..=3u8)
            .rev()
            .map(|n| {
                [("hq", 480u32, 360u32), ("mq", 320, 180), ("", 120, 90)]
                    .iter()
                    .map(|(quality, w, h)| {
                        Thumbnail::with_size(
                            format!("https://i.ytimg.com/vi/{id}/{quality}{n}.jpg"),
                            *w,
                            *h,
                        )
                        .srcset()
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect()
    }
}

/// A short-form video result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortEntry {
    #[serde(flatten)]
    pub entry: EntryCommon,
    #[serde(alias = "view_count")]
    pub views: u64,
}

/// A regular video result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEntry {
    #[serde(flatten)]
    pub entry: EntryCommon,
    #[serde(flatten)]
    pub channel: ChannelInfo,
    #[serde(default, alias = "view_count")]
    pub views: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Unix upload time; preferred over the coarser `upload_date`.
    #[serde(default, deserialize_with = "dates::opt_date")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::opt_date")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub live_status: Option<LiveStatus>,
    #[serde(default, alias = "release_timestamp", deserialize_with = "dates::opt_date")]
    pub live_release_date: Option<DateTime<Utc>>,
}

impl VideoEntry {
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or(self.upload_date)
    }

    /// Live release time when known, otherwise the upload time.
    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        self.live_release_date.or_else(|| self.uploaded_at())
    }
}

/// Video-shaped entry from live/partial data; its view count comes from the
/// concurrent-viewers field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialEntry {
    #[serde(flatten)]
    pub entry: EntryCommon,
    #[serde(flatten)]
    pub channel: ChannelInfo,
    #[serde(default, alias = "concurrent_view_count")]
    pub views: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "dates::opt_date")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub live_status: Option<LiveStatus>,
    #[serde(default, alias = "release_timestamp", deserialize_with = "dates::opt_date")]
    pub live_release_date: Option<DateTime<Utc>>,
}

/// A nested playlist link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[serde(flatten)]
    pub entry: EntryCommon,
}

impl PlaylistEntry {
    /// Same-origin URL that loads this playlist's contents.
    pub fn load_url(&self) -> String {
        format!(
            "/api/playlist?url={}",
            urlencoding::encode(&self.entry.url)
        )
    }
}

/// A channel result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    #[serde(flatten)]
    pub entry: EntryCommon,
    pub uploader: String,
    pub uploader_id: String,
    pub uploader_url: String,
    #[serde(default, alias = "channel_follower_count")]
    pub followers: Option<u64>,
}

impl ChannelEntry {
    pub fn shortest_url(&self) -> &str {
        if self.uploader_url.len() < self.entry.url.len() {
            &self.uploader_url
        } else {
            &self.entry.url
        }
    }
}

/// A non-entry navigational result, e.g. a channel tab link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLink {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Everything a search result set may contain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entry_type")]
pub enum SearchEntry {
    ShortEntry(ShortEntry),
    VideoEntry(VideoEntry),
    PartialEntry(PartialEntry),
    ChannelEntry(ChannelEntry),
    PlaylistEntry(PlaylistEntry),
    SearchLink(SearchLink),
}

impl SearchEntry {
    /// Stable identity used for de-duplication; tab links fall back to URL.
    pub fn key(&self) -> &str {
        match self {
            Self::ShortEntry(e) => &e.entry.id,
            Self::VideoEntry(e) => &e.entry.id,
            Self::PartialEntry(e) => &e.entry.id,
            Self::ChannelEntry(e) => &e.entry.id,
            Self::PlaylistEntry(e) => &e.entry.id,
            Self::SearchLink(l) => &l.url,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::ShortEntry(e) => &e.entry.title,
            Self::VideoEntry(e) => &e.entry.title,
            Self::PartialEntry(e) => &e.entry.title,
            Self::ChannelEntry(e) => &e.entry.title,
            Self::PlaylistEntry(e) => &e.entry.title,
            Self::SearchLink(l) => &l.title,
        }
    }
}

/// Entries a playlist may contain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entry_type")]
pub enum PlaylistItem {
    ShortEntry(ShortEntry),
    VideoEntry(VideoEntry),
    PartialEntry(PartialEntry),
}

impl PlaylistItem {
    pub fn key(&self) -> &str {
        &self.common().id
    }

    pub fn common(&self) -> &EntryCommon {
        match self {
            Self::ShortEntry(e) => &e.entry,
            Self::VideoEntry(e) => &e.entry,
            Self::PartialEntry(e) => &e.entry,
        }
    }

    pub fn common_mut(&mut self) -> &mut EntryCommon {
        match self {
            Self::ShortEntry(e) => &mut e.entry,
            Self::VideoEntry(e) => &mut e.entry,
            Self::PartialEntry(e) => &mut e.entry,
        }
    }
}

impl HasThumbnails for ShortEntry {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.entry.thumbnails
    }
}

impl HasThumbnails for VideoEntry {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.entry.thumbnails
    }
}

impl HasThumbnails for PartialEntry {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.entry.thumbnails
    }
}

impl HasThumbnails for PlaylistEntry {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.entry.thumbnails
    }
}

impl HasThumbnails for ChannelEntry {
    fn thumbnails(&self) -> &[Thumbnail] {
        &self.entry.thumbnails
    }
}

impl HasHoverPreviews for ShortEntry {
    fn preview_id(&self) -> &str {
        &self.entry.id
    }
}

impl HasHoverPreviews for VideoEntry {
    fn preview_id(&self) -> &str {
        &self.entry.id
    }
}

impl HasHoverPreviews for PartialEntry {
    fn preview_id(&self) -> &str {
        &self.entry.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_deserialization_picks_variant() {
        let raw = serde_json::json!({
            "entry_type": "ShortEntry",
            "id": "abc123",
            "url": "https://youtube.com/shorts/abc123",
            "title": "A short",
            "view_count": 42,
        });
        let entry: SearchEntry = serde_json::from_value(raw).unwrap();
        match entry {
            SearchEntry::ShortEntry(s) => {
                assert_eq!(s.entry.id, "abc123");
                assert_eq!(s.views, 42);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn video_entry_flattens_channel_fields() {
        let raw = serde_json::json!({
            "entry_type": "VideoEntry",
            "id": "v1",
            "url": "https://youtube.com/watch?v=v1",
            "title": "A video",
            "channel": "Some Channel",
            "channel_url": "https://youtube.com/channel/UCxyz",
            "uploader_url": "https://youtube.com/@handle",
            "view_count": 1000,
            "timestamp": 1700000000,
            "live_status": "not_live",
        });
        let entry: SearchEntry = serde_json::from_value(raw).unwrap();
        let SearchEntry::VideoEntry(v) = entry else {
            panic!("wrong variant");
        };
        assert_eq!(v.channel.channel_name.as_deref(), Some("Some Channel"));
        assert_eq!(
            v.channel.shortest_channel_url(),
            Some("https://youtube.com/@handle")
        );
        assert_eq!(v.views, Some(1000));
        assert_eq!(v.uploaded_at().unwrap().timestamp(), 1_700_000_000);
        assert_eq!(v.live_status, Some(LiveStatus::NotLive));
    }

    #[test]
    fn partial_entry_views_come_from_concurrent_count() {
        let raw = serde_json::json!({
            "entry_type": "PartialEntry",
            "id": "p1",
            "url": "https://youtube.com/watch?v=p1",
            "title": "Live now",
            "concurrent_view_count": 512,
            "live_status": "is_live",
        });
        let entry: SearchEntry = serde_json::from_value(raw).unwrap();
        let SearchEntry::PartialEntry(p) = entry else {
            panic!("wrong variant");
        };
        assert_eq!(p.views, Some(512));
    }

    #[test]
    fn playlist_item_rejects_foreign_variants() {
        let raw = serde_json::json!({
            "entry_type": "ChannelEntry",
            "id": "c1",
            "url": "https://youtube.com/channel/c1",
            "title": "chan",
            "uploader": "u",
            "uploader_id": "uid",
            "uploader_url": "https://youtube.com/@u",
        });
        assert!(serde_json::from_value::<PlaylistItem>(raw).is_err());
    }

    #[test]
    fn hover_srcsets_emit_three_frames_descending() {
        let raw = serde_json::json!({
            "id": "vid", "url": "https://youtube.com/watch?v=vid",
            "title": "t", "view_count": 1,
        });
        let short: ShortEntry = serde_json::from_value(raw).unwrap();
        let sets = short.hover_srcsets();
        assert_eq!(sets.len(), 3);
        assert!(sets[0].contains("hq3.jpg"));
        assert!(sets[2].contains("hq1.jpg"));
        assert!(sets[0].contains("480w"));
    }

    #[test]
    fn playlist_entry_load_url_is_same_origin() {
        let raw = serde_json::json!({
            "entry_type": "PlaylistEntry",
            "id": "PL9",
            "url": "https://youtube.com/playlist?list=PL9",
            "title": "Mix",
        });
        let entry: SearchEntry = serde_json::from_value(raw).unwrap();
        let SearchEntry::PlaylistEntry(p) = entry else {
            panic!("wrong variant");
        };
        assert_eq!(
            p.load_url(),
            "/api/playlist?url=https%3A%2F%2Fyoutube.com%2Fplaylist%3Flist%3DPL9"
        );
    }

    #[test]
    fn channel_entry_prefers_the_shorter_url() {
        let handle: ChannelEntry = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "url": "https://youtube.com/channel/UCxyzxyzxyzxyzxyzxyz",
            "title": "chan",
            "uploader": "u",
            "uploader_id": "@u",
            "uploader_url": "https://youtube.com/@u",
        }))
        .unwrap();
        assert_eq!(handle.shortest_url(), "https://youtube.com/@u");

        let canonical: ChannelEntry = serde_json::from_value(serde_json::json!({
            "id": "c2",
            "url": "https://youtube.com/@u",
            "title": "chan",
            "uploader": "u",
            "uploader_id": "@u",
            "uploader_url": "https://youtube.com/@ulonghandlename",
        }))
        .unwrap();
        assert_eq!(canonical.shortest_url(), "https://youtube.com/@u");
    }

    #[test]
    fn serialization_round_trips_through_own_field_names() {
        let raw = serde_json::json!({
            "entry_type": "VideoEntry",
            "id": "v1", "url": "https://youtube.com/watch?v=v1",
            "title": "T", "view_count": 7,
        });
        let entry: SearchEntry = serde_json::from_value(raw).unwrap();
        let text = serde_json::to_string(&entry).unwrap();
        let back: SearchEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(back.key(), "v1");
        let SearchEntry::VideoEntry(v) = back else {
            panic!("wrong variant");
        };
        assert_eq!(v.views, Some(7));
    }
}
