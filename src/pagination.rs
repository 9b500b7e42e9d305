//! Incremental result-set accumulation across "load more" requests.
//!
//! An accumulator lives for one request: it is rebuilt from the client's
//! resubmitted query parameters, advanced at most once, filled by at most
//! one extraction round trip, and discarded with the response.

use serde::Deserialize;

use crate::model::{PlaylistItem, SearchEntry};

/// Default page size for view handlers.
pub const DEFAULT_PER_PAGE: u32 = 12;

/// Continuation token resubmitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Set when the caller has scrolled past what is loaded.
    pub more: Option<bool>,
}

/// Entries that carry a stable de-duplication key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for SearchEntry {
    fn key(&self) -> &str {
        SearchEntry::key(self)
    }
}

impl Keyed for PlaylistItem {
    fn key(&self) -> &str {
        PlaylistItem::key(self)
    }
}

/// Per-request pagination state.
#[derive(Debug, Clone)]
pub struct Pagination<T> {
    page: u32,
    per_page: u32,
    /// No further pages exist upstream.
    pub done: bool,
    more_requested: bool,
    entries: Vec<T>,
}

impl<T: Keyed> Pagination<T> {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            done: false,
            more_requested: false,
            entries: Vec::new(),
        }
    }

    pub fn from_query(query: &PageQuery) -> Self {
        let mut pagination = Self::new(
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        );
        pagination.more_requested = query.more.unwrap_or(false);
        pagination
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// True when the accumulated set is empty or the caller has scrolled
    /// past what is loaded, and upstream is not exhausted.
    pub fn needs_more_data(&self) -> bool {
        !self.done && (self.entries.is_empty() || self.more_requested)
    }

    /// Move to the next page if and only if the caller asked for more data;
    /// otherwise a no-op.
    pub fn advance(&mut self) -> &mut Self {
        if self.more_requested && !self.done {
            self.page += 1;
            self.more_requested = false;
        }
        self
    }

    /// Append newly fetched entries, skipping ids already present; a page
    /// shorter than requested marks the accumulator exhausted.
    pub fn add(&mut self, new_entries: Vec<T>) {
        if (new_entries.len() as u32) < self.per_page {
            self.done = true;
        }
        for entry in new_entries {
            if !self.entries.iter().any(|e| e.key() == entry.key()) {
                self.entries.push(entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> SearchEntry {
        serde_json::from_value(serde_json::json!({
            "entry_type": "VideoEntry",
            "id": id,
            "url": format!("https://youtube.com/watch?v={id}"),
            "title": id,
        }))
        .unwrap()
    }

    #[test]
    fn advance_is_noop_without_more_request() {
        let mut pg: Pagination<SearchEntry> = Pagination::from_query(&PageQuery {
            page: Some(2),
            per_page: Some(12),
            more: None,
        });
        pg.advance();
        assert_eq!(pg.page(), 2);
        assert!(pg.needs_more_data());
    }

    #[test]
    fn advance_moves_one_page_when_more_requested() {
        let mut pg: Pagination<SearchEntry> = Pagination::from_query(&PageQuery {
            page: Some(2),
            per_page: Some(12),
            more: Some(true),
        });
        pg.advance();
        assert_eq!(pg.page(), 3);
        // A second advance within the same request is a no-op.
        pg.advance();
        assert_eq!(pg.page(), 3);
    }

    #[test]
    fn add_skips_duplicate_ids_and_keeps_order() {
        let mut pg: Pagination<SearchEntry> = Pagination::new(1, 2);
        pg.add(vec![entry("a"), entry("b")]);
        pg.add(vec![entry("b"), entry("c")]);
        let ids: Vec<&str> = pg.entries().iter().map(|e| e.key()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn short_page_marks_exhausted() {
        let mut pg: Pagination<SearchEntry> = Pagination::new(1, 12);
        assert!(pg.needs_more_data());
        pg.add(vec![entry("a")]);
        assert!(pg.done);
        assert!(!pg.needs_more_data());
    }

    #[test]
    fn full_page_leaves_more_data_available() {
        let mut pg: Pagination<SearchEntry> = Pagination::new(1, 2);
        pg.add(vec![entry("a"), entry("b")]);
        assert!(!pg.done);
        // Accumulated set satisfies the current view.
        assert!(!pg.needs_more_data());
    }

    #[test]
    fn page_clamps_to_one() {
        let pg: Pagination<SearchEntry> = Pagination::new(0, 0);
        assert_eq!(pg.page(), 1);
        assert_eq!(pg.per_page(), 1);
    }
}
