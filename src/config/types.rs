use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default page size for view handlers.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_per_page() -> u32 {
    12
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Canonical origin inbound URLs are rewritten to before extraction.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Referer sent with every outbound media request.
    #[serde(default = "default_origin")]
    pub referer: String,

    /// Timeout for establishing outbound connections, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_origin() -> String {
    "https://youtube.com".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            referer: default_origin(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// Executable invoked for metadata extraction.
    #[serde(default = "default_program")]
    pub program: String,

    /// Concurrent extraction ceiling; excess work queues.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Attempts before an empty extraction result becomes fatal.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Retained (page, per_page) extractor configurations.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_program() -> String {
    "yt-dlp".to_string()
}
fn default_pool_size() -> usize {
    16
}
fn default_max_attempts() -> u32 {
    10
}
fn default_base_delay() -> u64 {
    500
}
fn default_max_delay() -> u64 {
    30_000
}
fn default_cache_capacity() -> usize {
    8
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            pool_size: default_pool_size(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            cache_capacity: default_cache_capacity(),
        }
    }
}
