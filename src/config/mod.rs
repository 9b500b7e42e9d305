mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./tubegate.toml",
        "~/.config/tubegate/config.toml",
        "/etc/tubegate/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    Url::parse(&config.upstream.origin)
        .with_context(|| format!("Invalid upstream origin: {}", config.upstream.origin))?;

    if config.extractor.pool_size == 0 {
        anyhow::bail!("Extractor pool size cannot be 0");
    }
    if config.extractor.max_attempts == 0 {
        anyhow::bail!("Extractor max attempts cannot be 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.extractor.pool_size, 16);
        assert_eq!(config.extractor.max_attempts, 10);
        assert_eq!(config.extractor.cache_capacity, 8);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[extractor]\npool_size = 4\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.extractor.pool_size, 4);
        assert_eq!(config.upstream.origin, "https://youtube.com");
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\norigin = \"not a url\"\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
