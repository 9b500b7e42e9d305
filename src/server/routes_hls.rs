//! HLS playlist endpoints: master synthesis, variant synthesis, filtering.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::hls::{self, HLS_MIME};
use crate::model::Format;

use super::routes_vtt::fetch_video;
use super::AppContext;

const VARIANT_API: &str = "/generate_hls/variant";
const PROXY_API: &str = "/proxy/get";

pub fn hls_routes() -> Router<AppContext> {
    Router::new()
        .route("/generate_hls/master", get(master))
        .route("/generate_hls/variant", get(variant))
        .route("/filter_hls/master", get(filter_master))
}

#[derive(Debug, Deserialize)]
pub struct MasterQuery {
    pub video_url: String,
}

async fn master(
    State(ctx): State<AppContext>,
    Query(query): Query<MasterQuery>,
) -> Result<impl IntoResponse> {
    let video = fetch_video(&ctx, &query.video_url).await?;
    let text = hls::master_playlist(VARIANT_API, &video)?;
    Ok(([(header::CONTENT_TYPE, HLS_MIME)], text))
}

#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    pub format_json: String,
}

async fn variant(
    State(ctx): State<AppContext>,
    Query(query): Query<VariantQuery>,
) -> Result<impl IntoResponse> {
    let format: Format = serde_json::from_str(&query.format_json)?;

    if format.has_dash() {
        let text = hls::dash_variant_playlist(PROXY_API, &format)?;
        return Ok(([(header::CONTENT_TYPE, HLS_MIME)], text));
    }

    // Progressive formats are probed for internal segment boundaries; the
    // playlist then addresses byte ranges of the single proxied media URL.
    let reply = ctx.http.get(&format.url).send().await?;
    if !reply.status().is_success() {
        return Err(Error::Upstream {
            status: reply.status().as_u16(),
        });
    }

    let media_url = format!("{PROXY_API}?url={}", urlencoding::encode(&format.url));
    let body = Box::pin(reply.bytes_stream());
    let text = hls::variant_playlist(&media_url, body).await?;
    Ok(([(header::CONTENT_TYPE, HLS_MIME)], text))
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub content: String,
    pub height: u32,
    pub fps: f64,
}

async fn filter_master(Query(query): Query<FilterQuery>) -> impl IntoResponse {
    let modified = hls::filter_master_playlist(&query.content, query.height, query.fps);
    ([(header::CONTENT_TYPE, HLS_MIME)], modified)
}
