//! Deliverable stream formats, fragments, chapters, and live status.

use serde::{Deserialize, Serialize};

/// Protocol tag of DASH-segmented formats.
pub const DASH_PROTOCOL: &str = "http_dash_segments";

/// Live status of a video, as reported by the extraction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStatus {
    IsUpcoming,
    IsLive,
    /// Was live, but the VOD is not yet processed.
    PostLive,
    WasLive,
    NotLive,
}

/// One addressable piece of a segmented format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// One deliverable stream of a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    #[serde(alias = "format_id")]
    pub id: String,
    #[serde(default, alias = "format_note")]
    pub name: Option<String>,
    pub protocol: String,
    pub url: String,
    #[serde(default)]
    pub manifest_url: Option<String>,
    #[serde(default, alias = "fragment_base_url")]
    pub dash_fragments_base_url: Option<String>,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    /// Storyboard grid rows.
    #[serde(default)]
    pub rows: Option<u32>,
    /// Storyboard grid columns.
    #[serde(default)]
    pub columns: Option<u32>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default, alias = "vcodec")]
    pub video_codec: Option<String>,
    #[serde(default, alias = "acodec")]
    pub audio_codec: Option<String>,
    /// Average bitrate in kbit/s.
    #[serde(default, alias = "tbr")]
    pub average_bitrate: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub dynamic_range: Option<String>,
    #[serde(default)]
    pub audio_channels: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
}

impl Format {
    /// Whether this format is delivered as DASH segments.
    pub fn has_dash(&self) -> bool {
        self.protocol == DASH_PROTOCOL
    }

    /// Video codec with the `"none"` sentinel normalized to absent.
    pub fn vcodec(&self) -> Option<&str> {
        normalize_codec(self.video_codec.as_deref())
    }

    /// Audio codec with the `"none"` sentinel normalized to absent.
    pub fn acodec(&self) -> Option<&str> {
        normalize_codec(self.audio_codec.as_deref())
    }

    /// Storyboard formats carry tiled preview images, not media.
    pub fn is_storyboard(&self) -> bool {
        self.name.as_deref() == Some("storyboard")
    }

    /// Whether the format carries only audio.
    pub fn is_audio_only(&self) -> bool {
        self.vcodec().is_none() && self.acodec().is_some()
    }
}

fn normalize_codec(codec: Option<&str>) -> Option<&str> {
    match codec {
        None | Some("none") | Some("") => None,
        other => other,
    }
}

/// A titled time span within a video; `start_sec <= end_sec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(alias = "start_time")]
    pub start_sec: f64,
    #[serde(alias = "end_time")]
    pub end_sec: f64,
    pub title: String,
}

impl Chapter {
    pub fn new(start_sec: f64, end_sec: f64, title: impl Into<String>) -> Self {
        Self {
            start_sec,
            end_sec,
            title: title.into(),
        }
    }
}
