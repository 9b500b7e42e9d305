//! HLS manifest synthesis and rewriting.
//!
//! Every media URL embedded in a generated manifest is expressed relative
//! to the stream proxy so the browser never leaves this origin.

mod master;
mod variant;

pub use master::{filter_master_playlist, master_playlist, sort_master_playlist};
pub use variant::{dash_variant_playlist, variant_playlist};

/// Primary playlist MIME type.
pub const HLS_MIME: &str = "application/x-mpegURL";
/// Alternate playlist MIME type used by some upstreams.
pub const HLS_ALT_MIME: &str = "application/vnd.apple.mpegurl";

/// Whether a content type denotes an HLS playlist.
pub fn is_playlist_mime(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == HLS_MIME.to_ascii_lowercase() || essence == HLS_ALT_MIME.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_mime_matching_ignores_case_and_params() {
        assert!(is_playlist_mime("application/x-mpegURL"));
        assert!(is_playlist_mime("application/X-MPEGURL; charset=utf-8"));
        assert!(is_playlist_mime("application/vnd.apple.mpegurl"));
        assert!(!is_playlist_mime("video/mp2t"));
    }
}
