//! Stream proxy integration tests against a wiremock upstream.

mod common;

use std::sync::Arc;

use common::{ScriptedEngine, TestHarness};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn proxy_server() -> (MockServer, String) {
    let upstream = MockServer::start().await;
    let engine = Arc::new(ScriptedEngine::new(vec![]));
    let (_harness, addr) = TestHarness::with_server(engine).await;
    (upstream, format!("http://{addr}"))
}

fn proxied(base: &str, upstream_url: &str) -> String {
    format!("{base}/proxy/get?url={}", urlencoding::encode(upstream_url))
}

#[tokio::test]
async fn range_request_is_forwarded_upstream() {
    let (upstream, base) = proxy_server().await;

    Mock::given(method("GET"))
        .and(path("/media.mp4"))
        .and(header("Range", "bytes=0-99"))
        .respond_with(
            ResponseTemplate::new(206)
                .set_body_bytes(vec![0u8; 100])
                .insert_header("accept-ranges", "bytes")
                .insert_header("x-content-type-options", "nosniff")
                .insert_header("etag", "\"abc\"")
                .insert_header("content-type", "video/mp4"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let client = reqwest::Client::new();
    let resp = client
        .get(proxied(&base, &format!("{}/media.mp4", upstream.uri())))
        .header("Range", "bytes=0-99")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("accept-ranges").unwrap(),
        "bytes"
    );
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    // Cache-related headers never pass through.
    assert!(resp.headers().get("etag").is_none());
    assert_eq!(resp.headers().get("content-type").unwrap(), "video/mp4");
    assert_eq!(resp.bytes().await.unwrap().len(), 100);
}

#[tokio::test]
async fn playlist_urls_are_rewritten_and_variants_sorted() {
    let (upstream, base) = proxy_server().await;

    let manifest = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=1280x720\n\
        https://cdn.example/720.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
        https://cdn.example/1080.m3u8\n";

    Mock::given(method("GET"))
        .and(path("/master.m3u8"))
        .respond_with(
            // `set_body_string` pins the mime to text/plain and wiremock
            // lets it override `insert_header`; `set_body_raw` carries the
            // intended content-type.
            ResponseTemplate::new(200).set_body_raw(manifest, "application/x-mpegURL"),
        )
        .mount(&upstream)
        .await;

    let resp = reqwest::get(proxied(&base, &format!("{}/master.m3u8", upstream.uri())))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/x-mpegURL"
    );

    let body = resp.text().await.unwrap();
    assert!(body.contains("/proxy/get?url=https%3A%2F%2Fcdn.example%2F720.m3u8"));
    assert!(body.contains("/proxy/get?url=https%3A%2F%2Fcdn.example%2F1080.m3u8"));
    assert!(!body.contains("\nhttps://cdn.example"));

    // 1080p comes first after re-sorting despite appearing second upstream.
    let p1080 = body.find("1080.m3u8").unwrap();
    let p720 = body.find("720.m3u8").unwrap();
    assert!(p1080 < p720);
}

#[tokio::test]
async fn transport_stream_mime_is_fixed_by_extension() {
    let (upstream, base) = proxy_server().await;

    Mock::given(method("GET"))
        .and(path("/seg/0001.ts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x47u8; 188])
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(&upstream)
        .await;

    let resp = reqwest::get(proxied(
        &base,
        &format!("{}/seg/0001.ts?token=1", upstream.uri()),
    ))
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "video/mp2t");
}

#[tokio::test]
async fn upstream_failure_status_is_relayed() {
    let (upstream, base) = proxy_server().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;

    let resp = reqwest::get(proxied(&base, &format!("{}/gone", upstream.uri())))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = reqwest::get(proxied(&base, &format!("{}/broken", upstream.uri())))
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
}
