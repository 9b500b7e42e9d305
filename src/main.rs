mod cli;

use tubegate::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use url::Url;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubegate=trace,tower_http=debug".to_string()
        } else {
            "tubegate=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = config::load_config_or_default(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::start_server(config))
        }
        Commands::Inspect {
            url,
            page,
            per_page,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(inspect(config, &url, page, per_page))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::CheckTools => check_tools(),
        Commands::Version => {
            println!("tubegate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn inspect(config: config::Config, url: &str, page: u32, per_page: u32) -> Result<()> {
    let extractor = server::build_extractor(&config)?;
    let client = extractor.client(page, per_page);
    let url = client.convert_url(&Url::parse(url)?)?;

    let json = if url.path().starts_with("/watch") {
        serde_json::to_string_pretty(&client.video(&url).await?)?
    } else if url.path().starts_with("/playlist") {
        serde_json::to_string_pretty(&client.playlist(&url).await?)?
    } else {
        serde_json::to_string_pretty(&client.search(&url).await?)?
    };
    println!("{}", json);
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upstream origin: {}", config.upstream.origin);
            println!("  Extractor: {}", config.extractor.program);
            println!("  Pool size: {}", config.extractor.pool_size);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upstream origin: {}", config.upstream.origin);
        }
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    match which::which("yt-dlp") {
        Ok(path) => {
            println!("✓ yt-dlp - {}", path.display());
            Ok(())
        }
        Err(_) => {
            println!("✗ yt-dlp not found on PATH");
            println!("Install it to enable metadata extraction.");
            Ok(())
        }
    }
}
