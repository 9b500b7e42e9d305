use crate::config::Config;
use crate::extract::{Extractor, RetryPolicy, YtDlpEngine};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use url::Url;

pub mod routes_api;
pub mod routes_hls;
pub mod routes_proxy;
pub mod routes_vtt;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Shared extraction service (engine, worker pool, options cache).
    pub extractor: Arc<Extractor>,
    /// Outbound client for media and manifest relaying.
    pub http: reqwest::Client,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_vtt::vtt_routes())
        .merge(routes_hls::hls_routes())
        .merge(routes_proxy::proxy_routes())
        .nest("/api", routes_api::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build the outbound HTTP client shared by the proxy and HLS handlers.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::REFERER,
        config
            .upstream
            .referer
            .parse()
            .context("Invalid upstream referer")?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Build the shared extraction service from configuration.
pub fn build_extractor(config: &Config) -> Result<Extractor> {
    let engine = YtDlpEngine::with_program(&config.extractor.program);
    let policy = RetryPolicy {
        max_attempts: config.extractor.max_attempts,
        base_delay: Duration::from_millis(config.extractor.base_delay_ms),
        max_delay: Duration::from_millis(config.extractor.max_delay_ms),
    };
    let origin = Url::parse(&config.upstream.origin).context("Invalid upstream origin")?;

    Ok(Extractor::new(
        Arc::new(engine),
        config.extractor.pool_size,
        policy,
        config.extractor.cache_capacity,
        origin,
    ))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext {
        extractor: Arc::new(build_extractor(&config)?),
        http: build_http_client(&config)?,
        config: Arc::new(config),
    };

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
