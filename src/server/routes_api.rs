//! JSON view handlers.
//!
//! Each handler rebuilds its pagination accumulator from the client's
//! resubmitted query parameters, advances it at most once, and fills it
//! with at most one extraction round trip.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::model::{Channel, PlaylistItem, SearchEntry, Video};
use crate::pagination::{PageQuery, Pagination};

use super::routes_vtt::fetch_video;
use super::AppContext;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/results", get(results))
        .route("/playlist", get(playlist))
        .route("/channel", get(channel))
        .route("/video", get(video))
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub title: String,
    pub page: u32,
    pub done: bool,
    pub entries: Vec<T>,
}

// Paging fields are spelled out per query struct; serde_urlencoded cannot
// deserialize numbers through #[serde(flatten)].
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub search_query: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub more: Option<bool>,
}

async fn results(
    State(ctx): State<AppContext>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse> {
    let mut pg: Pagination<SearchEntry> = Pagination::from_query(&page_query(
        query.page,
        query.per_page,
        query.more,
    ));
    pg.advance();

    let client = ctx.extractor.client(pg.page(), pg.per_page());
    let mut url = Url::parse(&ctx.config.upstream.origin)
        .map_err(|e| Error::internal(format!("bad configured origin: {e}")))?;
    url.set_path("/results");
    url.query_pairs_mut()
        .append_pair("search_query", &query.search_query);

    let search = client.search(&url).await?;
    pg.add(search.entries);

    Ok(Json(PageResponse {
        title: search.title,
        page: pg.page(),
        done: pg.done,
        entries: pg.entries().to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub more: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub views: Option<u64>,
    pub total_entries: Option<u64>,
    pub page: u32,
    pub done: bool,
    pub entries: Vec<PlaylistItem>,
}

async fn playlist(
    State(ctx): State<AppContext>,
    Query(query): Query<UrlQuery>,
) -> Result<impl IntoResponse> {
    let url = parse_url(&query.url)?;
    let mut pg: Pagination<PlaylistItem> = Pagination::from_query(&page_query(
        query.page,
        query.per_page,
        query.more,
    ));
    pg.advance();

    let client = ctx.extractor.client(pg.page(), pg.per_page());
    let url = client.convert_url(&url)?;
    let mut playlist = client.playlist(&url).await?;
    let entries = std::mem::take(&mut playlist.entries);
    pg.add(entries);

    Ok(Json(PlaylistResponse {
        id: playlist.id,
        title: playlist.title,
        description: playlist.description,
        views: playlist.views,
        total_entries: playlist.total_entries,
        page: pg.page(),
        done: pg.done,
        entries: pg.entries().to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    pub url: String,
    pub tab: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub more: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub title: String,
    pub description: String,
    pub tab: String,
    pub followers: Option<u64>,
    pub page: u32,
    pub done: bool,
    pub entries: Vec<SearchEntry>,
}

async fn channel(
    State(ctx): State<AppContext>,
    Query(query): Query<ChannelQuery>,
) -> Result<impl IntoResponse> {
    let url = parse_url(&query.url)?;
    let tab = query.tab.as_deref().unwrap_or("featured");
    let mut pg: Pagination<SearchEntry> = Pagination::from_query(&page_query(
        query.page,
        query.per_page,
        query.more,
    ));
    pg.advance();

    let client = ctx.extractor.client(pg.page(), pg.per_page());
    let url = client.convert_url(&url)?;
    let tab_url = Channel::tab_url(&url, tab);

    let channel = match client.channel(&tab_url).await {
        Ok(channel) => channel,
        // Some channels lack the requested tab entirely; fall back to the
        // landing tab once and stop paginating, so the caller still gets a
        // page instead of an error.
        Err(e) if tab != "featured" => {
            tracing::warn!(url = %tab_url, error = %e, "channel tab failed, using featured");
            pg.done = true;
            client.channel(&Channel::tab_url(&url, "featured")).await?
        }
        Err(e) => return Err(e),
    };

    pg.add(channel.entries);
    Ok(Json(ChannelResponse {
        title: channel.title,
        description: channel.description,
        tab: channel.tab,
        followers: channel.followers,
        page: pg.page(),
        done: pg.done,
        entries: pg.entries().to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    #[serde(flatten)]
    pub video: Video,
    pub manifest_url: String,
    pub storyboard_url: String,
    pub chapters_url: String,
}

async fn video(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
) -> Result<impl IntoResponse> {
    let video = fetch_video(&ctx, &query.url).await?;
    Ok(Json(VideoResponse {
        manifest_url: video.manifest_url(),
        storyboard_url: video.storyboard_url(),
        chapters_url: video.chapters_url(),
        video,
    }))
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::validation(format!("malformed url {url:?}: {e}")))
}

fn page_query(page: Option<u32>, per_page: Option<u32>, more: Option<bool>) -> PageQuery {
    PageQuery {
        page,
        per_page,
        more,
    }
}
