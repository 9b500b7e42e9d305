//! Bounded LRU cache of extractor configurations.
//!
//! Keyed by (page, page size); eviction is least-recently-used with a small
//! fixed capacity. Lookups take a short mutex, never held across an await.
//! Concurrent first-use of the same key may build duplicates; that is
//! bounded and harmless since configurations are immutable once built.

use std::sync::Arc;

use parking_lot::Mutex;

use super::engine::ExtractorOptions;

/// LRU cache mapping (page, per_page) to a shared [`ExtractorOptions`].
#[derive(Debug)]
pub struct OptionsCache {
    inner: Mutex<Vec<((u32, u32), Arc<ExtractorOptions>)>>,
    capacity: usize,
}

impl OptionsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Fetch the configuration for a window, building and caching it on miss.
    pub fn get(&self, page: u32, per_page: u32) -> Arc<ExtractorOptions> {
        let key = (page.max(1), per_page.max(1));
        let mut entries = self.inner.lock();

        if let Some(pos) = entries.iter().position(|(k, _)| *k == key) {
            let hit = entries.remove(pos);
            let options = hit.1.clone();
            entries.insert(0, hit);
            return options;
        }

        let options = Arc::new(ExtractorOptions::new(key.0, key.1));
        entries.insert(0, (key, options.clone()));
        entries.truncate(self.capacity);
        options
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}
