//! Classification of raw extraction records into entry variants.
//!
//! One total, deterministic function assigns exactly one discriminator tag
//! per record; the precedence order below is load-bearing and mirrored by
//! the tests.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};
use crate::model::CHANNEL_TABS;

/// Discriminator assigned to a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Short,
    Channel,
    Playlist,
    SearchLink,
    PartialVideo,
    Video,
}

impl EntryKind {
    /// The `entry_type` tag the typed model deserializes on.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Short => "ShortEntry",
            Self::Channel => "ChannelEntry",
            Self::Playlist => "PlaylistEntry",
            Self::SearchLink => "SearchLink",
            Self::PartialVideo => "PartialEntry",
            Self::Video => "VideoEntry",
        }
    }
}

/// Assign exactly one [`EntryKind`] to a raw record.
///
/// Precedence: shorts marker, channel-id marker, playlist view, channel tab
/// link, concurrent-viewers field, plain video.
pub fn classify(record: &Map<String, Value>) -> Result<EntryKind> {
    let url = record
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::validation("entry record has no url field"))?;

    if url.contains("/shorts/") {
        return Ok(EntryKind::Short);
    }
    if url.contains("/channel/") {
        return Ok(EntryKind::Channel);
    }
    if url.contains("/playlist?") {
        return Ok(EntryKind::Playlist);
    }
    if CHANNEL_TABS.iter().any(|tab| url.contains(&format!("/{tab}?"))) {
        return Ok(EntryKind::SearchLink);
    }
    if has_value(record, "concurrent_view_count") && !has_value(record, "view_count") {
        return Ok(EntryKind::PartialVideo);
    }
    Ok(EntryKind::Video)
}

/// Classify a record and write the resulting `entry_type` tag into it, plus
/// any fields the variant derives from the URL (the playlist id).
pub fn annotate(record: &mut Map<String, Value>) -> Result<()> {
    let kind = classify(record)?;

    if kind == EntryKind::Playlist && !has_value(record, "id") {
        let url = record
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let id = playlist_id_from_url(&url)?;
        record.insert("id".to_owned(), Value::String(id));
    }

    record.insert("entry_type".to_owned(), Value::String(kind.tag().to_owned()));
    Ok(())
}

fn has_value(record: &Map<String, Value>, key: &str) -> bool {
    record.get(key).is_some_and(|v| !v.is_null())
}

/// Derive a playlist id from the last `list` query parameter of its URL.
fn playlist_id_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::validation(format!("malformed playlist url {url:?}: {e}")))?;
    parsed
        .query_pairs()
        .filter(|(k, _)| k == "list")
        .last()
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| Error::validation(format!("playlist url {url:?} has no list parameter")))
}
