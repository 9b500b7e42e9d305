//! Same-origin stream proxy.
//!
//! Media requests from the player are relayed upstream with their `Range`
//! header; playlist responses are rewritten so every embedded URL points
//! back through this endpoint, everything else streams through unbuffered.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, Response, StatusCode},
    routing::get,
    Router,
};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::hls;

use super::AppContext;

const PROXY_API: &str = "/proxy/get";

/// Response headers relayed verbatim; anything else from upstream is
/// dropped (cache headers in particular break ranged delivery).
const RELAYED_HEADERS: [header::HeaderName; 3] = [
    header::ACCEPT_RANGES,
    header::CONTENT_LENGTH,
    header::X_CONTENT_TYPE_OPTIONS,
];

/// Absolute URLs inside a playlist, either alone on a line or quoted
/// inside an attribute list. CRLF mode keeps a carriage return out of the
/// captured URL.
fn manifest_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?mR)(^|")(https?://[^"]+?)($|")"#).expect("static pattern")
    })
}

pub fn proxy_routes() -> Router<AppContext> {
    Router::new().route(PROXY_API, get(proxy_get))
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

async fn proxy_get(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<ProxyQuery>,
) -> Result<Response<Body>> {
    // reqwest and axum track different `http` major versions; headers
    // cross the boundary as raw bytes.
    let mut request = ctx.http.get(&query.url);
    if let Some(range) = headers.get(header::RANGE) {
        request = request.header(reqwest::header::RANGE, range.as_bytes());
    }

    let reply = request.send().await?;
    if !reply.status().is_success() {
        return Err(Error::Upstream {
            status: reply.status().as_u16(),
        });
    }

    let mime = reply
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if mime.as_deref().is_some_and(hls::is_playlist_mime) {
        let data = reply.text().await?;
        let patched = patch_hls_manifest(&data);
        let mut response = Response::builder().status(StatusCode::OK);
        if let Some(mime) = &mime {
            response = response.header(header::CONTENT_TYPE, mime);
        }
        return response
            .body(Body::from(patched))
            .map_err(|e| Error::internal(e.to_string()));
    }

    let mime = if url_path(&query.url).ends_with(".ts") {
        Some("video/mp2t".to_owned())
    } else {
        mime
    };

    let mut response = Response::builder().status(reply.status().as_u16());
    for name in RELAYED_HEADERS {
        if let Some(value) = reply.headers().get(name.as_str()) {
            response = response.header(name, value.as_bytes());
        }
    }
    if let Some(mime) = &mime {
        response = response.header(header::CONTENT_TYPE, mime);
    }

    // The upstream connection closes when the body stream drops, whether
    // the response completed or the client went away.
    response
        .body(Body::from_stream(reply.bytes_stream()))
        .map_err(|e| Error::internal(e.to_string()))
}

/// Rewrite every absolute URL to pass back through the proxy, preserving
/// the surrounding delimiters, then re-sort master variants by quality.
fn patch_hls_manifest(data: &str) -> String {
    let rewritten = manifest_url_pattern().replace_all(data, |m: &Captures| {
        format!(
            "{}{PROXY_API}?url={}{}",
            &m[1],
            urlencoding::encode(&m[2]),
            &m[3]
        )
    });
    hls::sort_master_playlist(&rewritten)
}

fn url_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let without_query = without_scheme
        .split_once(['?', '#'])
        .map_or(without_scheme, |(path, _)| path);
    without_query
}
