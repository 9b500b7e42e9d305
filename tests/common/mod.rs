//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] around a
//! scripted extraction engine, and starts Axum on a random port for
//! HTTP-level testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use tubegate::config::Config;
use tubegate::extract::{ExtractionEngine, Extractor, ExtractorOptions, RetryPolicy};
use tubegate::server::{build_http_client, create_router, AppContext};
use tubegate::Result;

/// Engine returning canned extraction results, one per call.
pub struct ScriptedEngine {
    pub calls: AtomicU32,
    script: Vec<Option<Value>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Option<Value>>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            script,
        }
    }

    /// Engine answering every call with the same document.
    pub fn repeating(value: Value) -> Self {
        Self {
            calls: AtomicU32::new(0),
            script: vec![Some(value)],
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExtractionEngine for ScriptedEngine {
    fn extract(&self, _url: &str, _options: &ExtractorOptions) -> Result<Option<Value>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        if self.script.len() == 1 {
            return Ok(self.script[0].clone());
        }
        Ok(self.script.get(n).cloned().flatten())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Create a new harness around the given engine with default config.
    pub fn with_engine(engine: Arc<dyn ExtractionEngine>) -> Self {
        let config = Config::default();
        let policy = RetryPolicy {
            max_attempts: config.extractor.max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let origin = Url::parse(&config.upstream.origin).expect("default origin parses");

        let extractor = Extractor::new(
            engine,
            config.extractor.pool_size,
            policy,
            config.extractor.cache_capacity,
            origin,
        );

        let http = build_http_client(&config).expect("default http client builds");
        let ctx = AppContext {
            config: Arc::new(config),
            extractor: Arc::new(extractor),
            http,
        };
        Self { ctx }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(engine: Arc<dyn ExtractionEngine>) -> (Self, SocketAddr) {
        let harness = Self::with_engine(engine);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}
