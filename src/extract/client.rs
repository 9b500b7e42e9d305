//! Extraction client: typed aggregate fetching with retry and classification.

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::model::{Channel, Playlist, Search, Video};

use super::cache::OptionsCache;
use super::classify;
use super::engine::{ExtractionEngine, ExtractorOptions};
use super::pool::BlockingPool;
use super::retry::RetryPolicy;

/// Shared extraction service; hands out per-window clients.
pub struct Extractor {
    engine: Arc<dyn ExtractionEngine>,
    pool: Arc<BlockingPool>,
    policy: RetryPolicy,
    cache: OptionsCache,
    origin: Url,
}

impl Extractor {
    pub fn new(
        engine: Arc<dyn ExtractionEngine>,
        pool_capacity: usize,
        policy: RetryPolicy,
        cache_capacity: usize,
        origin: Url,
    ) -> Self {
        Self {
            engine,
            pool: Arc::new(BlockingPool::new(pool_capacity)),
            policy,
            cache: OptionsCache::new(cache_capacity),
            origin,
        }
    }

    /// Client for one (page, page-size) window; the underlying extractor
    /// configuration is shared through the options cache.
    pub fn client(&self, page: u32, per_page: u32) -> ExtractionClient {
        ExtractionClient {
            engine: self.engine.clone(),
            pool: self.pool.clone(),
            policy: self.policy,
            options: self.cache.get(page, per_page),
            origin: self.origin.clone(),
        }
    }
}

/// One extraction client bound to a page window.
pub struct ExtractionClient {
    engine: Arc<dyn ExtractionEngine>,
    pool: Arc<BlockingPool>,
    policy: RetryPolicy,
    options: Arc<ExtractorOptions>,
    origin: Url,
}

impl ExtractionClient {
    /// 0-based offset of this client's window.
    pub fn offset(&self) -> u64 {
        self.options.offset()
    }

    /// Normalize an inbound URL's scheme/host/port to the canonical origin,
    /// keeping path and query.
    pub fn convert_url(&self, url: &Url) -> Result<Url> {
        let mut converted = url.clone();
        converted
            .set_scheme(self.origin.scheme())
            .map_err(|_| Error::validation(format!("cannot set scheme on {url}")))?;
        converted
            .set_host(self.origin.host_str())
            .map_err(|e| Error::validation(format!("cannot set host on {url}: {e}")))?;
        converted
            .set_port(None)
            .map_err(|_| Error::validation(format!("cannot clear port on {url}")))?;
        Ok(converted)
    }

    /// Fetch a URL as a search result set.
    pub async fn search(&self, url: &Url) -> Result<Search> {
        let data = self.fetch(url.clone()).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Fetch a URL as a channel page.
    pub async fn channel(&self, url: &Url) -> Result<Channel> {
        let data = self.fetch(url.clone()).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Fetch a URL as a playlist; entries gain 1-based global ordinals and
    /// their URLs are augmented so a later single-video fetch can report
    /// its position.
    pub async fn playlist(&self, url: &Url) -> Result<Playlist> {
        let data = self.fetch(url.clone()).await?;
        let mut playlist: Playlist = serde_json::from_value(data)?;

        let offset = self.offset();
        let playlist_id = playlist.id.clone();
        for (i, item) in playlist.entries.iter_mut().enumerate() {
            let ordinal = offset + i as u64 + 1;
            let common = item.common_mut();
            common.index = Some(ordinal);
            common.url = with_query_params(
                &common.url,
                &[("list", &playlist_id), ("index", &ordinal.to_string())],
            )?;
        }
        Ok(playlist)
    }

    /// Fetch a URL as a single video; any playlist context is stripped
    /// before extraction.
    pub async fn video(&self, url: &Url) -> Result<Video> {
        let url = without_query_param(url, "list");
        let data = self.fetch(url).await?;
        let video: Video = serde_json::from_value(data)?;

        if let Some(chapters) = &video.chapters {
            for chapter in chapters {
                if chapter.start_sec > chapter.end_sec {
                    return Err(Error::validation(format!(
                        "chapter {:?} ends before it starts",
                        chapter.title
                    )));
                }
            }
        }
        Ok(video)
    }

    /// One extraction round trip with retry on empty results; every raw
    /// entry is classified before the typed aggregate is built.
    async fn fetch(&self, url: Url) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let engine = self.engine.clone();
            let options = self.options.clone();
            let target = url.to_string();
            let outcome = self
                .pool
                .run(move || engine.extract(&target, &options))
                .await?;

            match outcome {
                Some(mut data) => {
                    annotate_entries(&mut data)?;
                    return Ok(data);
                }
                None if self.policy.allows_retry(attempt) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(%url, attempt, ?delay, "empty extraction result, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => return Err(Error::NoData { attempts: attempt }),
            }
        }
    }
}

/// Classify every raw entry in place, writing discriminator tags.
fn annotate_entries(data: &mut Value) -> Result<()> {
    let root = data
        .as_object_mut()
        .ok_or_else(|| Error::validation("extraction result is not an object"))?;

    if let Some(entries) = root.get_mut("entries").and_then(Value::as_array_mut) {
        for entry in entries {
            let record = entry
                .as_object_mut()
                .ok_or_else(|| Error::validation("entry record is not an object"))?;
            classify::annotate(record)?;
        }
    }
    Ok(())
}

/// Return `url` with the given query parameters set, replacing existing ones.
fn with_query_params(url: &str, params: &[(&str, &str)]) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::validation(format!("malformed entry url {url:?}: {e}")))?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| params.iter().all(|(name, _)| k != name))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut rebuilt = parsed.clone();
    rebuilt.query_pairs_mut().clear();
    {
        let mut serializer = rebuilt.query_pairs_mut();
        for (k, v) in &kept {
            serializer.append_pair(k, v);
        }
        for (k, v) in params {
            serializer.append_pair(k, v);
        }
    }
    Ok(rebuilt.to_string())
}

/// Return `url` with one query parameter removed.
fn without_query_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut rebuilt = url.clone();
    rebuilt.set_query(None);
    if !kept.is_empty() {
        let mut serializer = rebuilt.query_pairs_mut();
        for (k, v) in &kept {
            serializer.append_pair(k, v);
        }
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Engine returning canned values, one per call.
    struct ScriptedEngine {
        calls: AtomicU32,
        script: Vec<Option<Value>>,
    }

    impl ScriptedEngine {
        fn new(script: Vec<Option<Value>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                script,
            }
        }
    }

    impl ExtractionEngine for ScriptedEngine {
        fn extract(&self, _url: &str, _options: &ExtractorOptions) -> Result<Option<Value>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(self.script.get(n).cloned().flatten())
        }
    }

    fn extractor_with(engine: Arc<ScriptedEngine>, policy: RetryPolicy) -> Extractor {
        Extractor::new(
            engine,
            4,
            policy,
            4,
            Url::parse("https://youtube.com").unwrap(),
        )
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 10,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn ten_empty_results_are_fatal_with_no_eleventh_attempt() {
        let engine = Arc::new(ScriptedEngine::new(vec![None; 20]));
        let extractor = extractor_with(engine.clone(), fast_policy());
        let client = extractor.client(1, 12);

        let err = client
            .search(&Url::parse("https://youtube.com/results?search_query=x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoData { attempts: 10 }));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn recovers_after_transient_emptiness() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            None,
            None,
            Some(serde_json::json!({
                "original_url": "https://youtube.com/results?search_query=x",
                "title": "x",
                "entries": [
                    {"id": "a", "url": "https://youtube.com/watch?v=a",
                     "title": "A", "view_count": 1},
                ],
            })),
        ]));
        let extractor = extractor_with(engine.clone(), fast_policy());
        let client = extractor.client(1, 12);

        let search = client
            .search(&Url::parse("https://youtube.com/results?search_query=x").unwrap())
            .await
            .unwrap();
        assert_eq!(search.entries.len(), 1);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn playlist_entries_gain_global_ordinals() {
        let engine = Arc::new(ScriptedEngine::new(vec![Some(serde_json::json!({
            "id": "PL1",
            "original_url": "https://youtube.com/playlist?list=PL1",
            "title": "Mix",
            "entries": [
                {"id": "a", "url": "https://youtube.com/watch?v=a",
                 "title": "A", "view_count": 1},
                {"id": "b", "url": "https://youtube.com/watch?v=b",
                 "title": "B", "view_count": 2},
            ],
        }))]));
        let extractor = extractor_with(engine, fast_policy());
        let client = extractor.client(3, 12);

        let playlist = client
            .playlist(&Url::parse("https://youtube.com/playlist?list=PL1").unwrap())
            .await
            .unwrap();
        let first = playlist.entries[0].common();
        assert_eq!(first.index, Some(25));
        assert!(first.url.contains("list=PL1"));
        assert!(first.url.contains("index=25"));
        assert_eq!(playlist.entries[1].common().index, Some(26));
    }

    #[tokio::test]
    async fn malformed_entry_surfaces_validation_error() {
        let engine = Arc::new(ScriptedEngine::new(vec![Some(serde_json::json!({
            "original_url": "https://youtube.com/results?search_query=x",
            "entries": [{"title": "entry without url"}],
        }))]));
        let extractor = extractor_with(engine, fast_policy());
        let client = extractor.client(1, 12);

        let err = client
            .search(&Url::parse("https://youtube.com/results?search_query=x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn convert_url_normalizes_to_origin() {
        let extractor = extractor_with(Arc::new(ScriptedEngine::new(vec![])), fast_policy());
        let client = extractor.client(1, 12);
        let input = Url::parse("http://localhost:8080/watch?v=abc").unwrap();
        let converted = client.convert_url(&input).unwrap();
        assert_eq!(converted.as_str(), "https://youtube.com/watch?v=abc");
    }

    #[test]
    fn query_param_helpers() {
        let rewritten =
            with_query_params("https://youtube.com/watch?v=a&list=OLD", &[("list", "PL1")])
                .unwrap();
        assert!(rewritten.contains("v=a"));
        assert!(rewritten.contains("list=PL1"));
        assert!(!rewritten.contains("OLD"));

        let url = Url::parse("https://youtube.com/watch?v=a&list=PL1").unwrap();
        let stripped = without_query_param(&url, "list");
        assert_eq!(stripped.as_str(), "https://youtube.com/watch?v=a");
    }
}
