//! WebVTT endpoints: chapter tracks and storyboard preview tracks.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::model::Video;
use crate::webvtt;

use super::AppContext;

const VTT_MIME: &str = "text/vtt";

pub fn vtt_routes() -> Router<AppContext> {
    Router::new()
        .route("/storyboard", get(storyboard))
        .route("/chapters", get(chapters))
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub video_url: String,
}

async fn storyboard(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
) -> Result<impl IntoResponse> {
    let video = fetch_video(&ctx, &query.video_url).await?;
    Ok(([(header::CONTENT_TYPE, VTT_MIME)], webvtt::storyboard(&video)))
}

async fn chapters(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
) -> Result<impl IntoResponse> {
    let video = fetch_video(&ctx, &query.video_url).await?;
    Ok(([(header::CONTENT_TYPE, VTT_MIME)], webvtt::chapters(&video)))
}

pub(super) async fn fetch_video(ctx: &AppContext, video_url: &str) -> Result<Video> {
    let url = Url::parse(video_url)
        .map_err(|e| Error::validation(format!("malformed video url {video_url:?}: {e}")))?;
    let client = ctx.extractor.client(1, ctx.config.server.per_page);
    let url = client.convert_url(&url)?;
    client.video(&url).await
}
