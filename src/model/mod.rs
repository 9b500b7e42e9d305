//! Typed data model for normalized extraction results.
//!
//! Raw extraction records are heterogeneous maps; after classification they
//! deserialize into the closed set of entry variants and aggregates defined
//! here. Field aliases follow the extraction engine's native key names so
//! records round-trip through JSON in both spellings.

mod aggregate;
mod dates;
mod entry;
mod format;
mod thumbnail;

pub use aggregate::{Channel, Playlist, Search, Video, CHANNEL_TABS};
pub use entry::{
    ChannelEntry, ChannelInfo, EntryCommon, HasHoverPreviews, PartialEntry, PlaylistEntry,
    PlaylistItem, SearchEntry, SearchLink, ShortEntry, VideoEntry,
};
pub use format::{Chapter, Format, Fragment, LiveStatus, DASH_PROTOCOL};
pub use thumbnail::{HasThumbnails, Thumbnail};
