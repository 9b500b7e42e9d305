//! Thumbnail candidates and best-thumbnail selection.

use serde::{Deserialize, Serialize};
use url::Url;

/// One image candidate attached to an entry or aggregate.
///
/// Immutable once constructed; all derived values are computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub preference: i32,
}

impl Thumbnail {
    /// Sentinel URL returned when no candidate survives selection.
    pub const NOT_FOUND_URL: &'static str = "/404";

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: None,
            width: None,
            height: None,
            preference: 0,
        }
    }

    pub fn with_size(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::new(url)
        }
    }

    /// Sentinel thumbnail for empty candidate sets.
    pub fn not_found() -> Self {
        Self::new(Self::NOT_FOUND_URL)
    }

    /// Absolute, same-origin-safe URL: protocol-relative URLs gain a scheme,
    /// everything else is routed through the stream proxy. The sentinel
    /// passes through untouched.
    pub fn fixed_url(&self) -> String {
        if self.url == Self::NOT_FOUND_URL {
            return self.url.clone();
        }
        let absolute = if self.url.starts_with("//") {
            format!("https:{}", self.url)
        } else {
            self.url.clone()
        };
        format!("/proxy/get?url={}", urlencoding::encode(&absolute))
    }

    /// File-extension suffix of the URL path, if any.
    pub fn suffix(&self) -> Option<String> {
        let path = match Url::parse(&self.url) {
            Ok(u) => u.path().to_owned(),
            Err(_) => self
                .url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_owned(),
        };
        let (_, ext) = path.rsplit_once('.')?;
        Some(ext.to_owned())
    }

    /// Responsive source descriptor, e.g. `/proxy/get?url=... 320w`.
    pub fn srcset(&self) -> String {
        format!("{} {}w", self.fixed_url(), self.width.unwrap_or(0))
    }
}

/// Derived thumbnail operations shared by entries and aggregates.
///
/// Selection: banner-capable sets are partitioned by the sign of
/// `preference` (negative means banner pool), then priority filters apply in
/// order - webp with known width, any known width, any webp, unfiltered -
/// taking the first non-empty result sorted descending by width.
pub trait HasThumbnails {
    fn thumbnails(&self) -> &[Thumbnail];

    fn has_banner(&self) -> bool {
        false
    }

    /// The single best candidate, or the `/404` sentinel if none exist.
    fn best_thumbnail(&self) -> Thumbnail {
        self.selected_thumbnails(false)
            .into_iter()
            .next()
            .unwrap_or_else(Thumbnail::not_found)
    }

    /// Comma-joined srcset, smallest candidate first.
    fn thumbnails_srcset(&self) -> String {
        join_srcset(&self.selected_thumbnails(false))
    }

    /// Banner-pool srcset; empty unless the entity declares banner capability.
    fn banners_srcset(&self) -> String {
        if !self.has_banner() {
            return String::new();
        }
        join_srcset(&self.selected_thumbnails(true))
    }

    #[doc(hidden)]
    fn selected_thumbnails(&self, banners: bool) -> Vec<Thumbnail> {
        let mut pool: Vec<Thumbnail> = self
            .thumbnails()
            .iter()
            .filter(|t| !self.has_banner() || banners == (t.preference < 0))
            .cloned()
            .collect();

        let webp_sized: Vec<Thumbnail> = pool
            .iter()
            .filter(|t| t.suffix().as_deref() == Some("webp") && t.width.is_some())
            .cloned()
            .collect();
        let sized: Vec<Thumbnail> = pool.iter().filter(|t| t.width.is_some()).cloned().collect();
        let webp: Vec<Thumbnail> = pool
            .iter()
            .filter(|t| t.suffix().as_deref() == Some("webp"))
            .cloned()
            .collect();

        if !webp_sized.is_empty() {
            pool = webp_sized;
        } else if !sized.is_empty() {
            pool = sized;
        } else if !webp.is_empty() {
            pool = webp;
        }

        pool.sort_by_key(|t| std::cmp::Reverse(t.width.unwrap_or(0)));
        pool
    }
}

fn join_srcset(thumbs: &[Thumbnail]) -> String {
    let mut parts: Vec<String> = thumbs.iter().map(Thumbnail::srcset).collect();
    parts.reverse();
    parts.join(", ")
}
