//! The opaque extraction engine boundary.
//!
//! The core only depends on the [`ExtractionEngine`] trait; the production
//! implementation shells out to `yt-dlp` and dumps a single JSON document
//! per invocation.

use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

use crate::error::{Error, Result};

/// Immutable extractor configuration for one (page, page-size) window.
///
/// Construction derives the engine's argument list once; instances are
/// shared across calls with the same window through the options cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOptions {
    pub page: u32,
    pub per_page: u32,
    args: Vec<String>,
}

impl ExtractorOptions {
    pub fn new(page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let offset = per_page as u64 * (page as u64 - 1);
        let args = vec![
            "--quiet".to_owned(),
            "--flat-playlist".to_owned(),
            "--playlist-start".to_owned(),
            (offset + 1).to_string(),
            "--playlist-end".to_owned(),
            (offset + per_page as u64).to_string(),
            "--compat-options".to_owned(),
            "no-youtube-unavailable-videos".to_owned(),
            // The ios client carries the HLS manifests; approximate_date
            // fills upload timestamps in flat playlists.
            "--extractor-args".to_owned(),
            "youtube:player_client=ios".to_owned(),
            "--extractor-args".to_owned(),
            "youtubetab:approximate_date=timestamp".to_owned(),
        ];
        Self {
            page,
            per_page,
            args,
        }
    }

    /// 0-based offset of the first entry in this window.
    pub fn offset(&self) -> u64 {
        self.per_page as u64 * (self.page as u64 - 1)
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Blocking extraction capability.
///
/// `Ok(None)` means the engine produced no data; the client treats that as
/// transient and retries. Engine failures are fatal for the attempt.
pub trait ExtractionEngine: Send + Sync + 'static {
    fn extract(&self, url: &str, options: &ExtractorOptions) -> Result<Option<Value>>;
}

/// Production engine: invokes the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: PathBuf,
}

impl YtDlpEngine {
    /// Locate `yt-dlp` on the PATH.
    pub fn discover() -> Result<Self> {
        let program = which::which("yt-dlp")
            .map_err(|e| Error::extractor(format!("yt-dlp not found: {e}")))?;
        Ok(Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ExtractionEngine for YtDlpEngine {
    fn extract(&self, url: &str, options: &ExtractorOptions) -> Result<Option<Value>> {
        let output = Command::new(&self.program)
            .args(options.args())
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--")
            .arg(url)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extractor(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }

        let data = serde_json::from_str(trimmed)
            .map_err(|e| Error::extractor(format!("unparsable yt-dlp output: {e}")))?;
        Ok(Some(data))
    }
}
