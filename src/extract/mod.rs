//! Metadata extraction: engine boundary, classification, retry, and the
//! typed client.

mod cache;
pub mod classify;
mod client;
mod engine;
mod pool;
mod retry;

pub use cache::OptionsCache;
pub use classify::EntryKind;
pub use client::{ExtractionClient, Extractor};
pub use engine::{ExtractionEngine, ExtractorOptions, YtDlpEngine};
pub use pool::BlockingPool;
pub use retry::RetryPolicy;
