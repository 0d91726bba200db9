//! Fetch integration tests against a local image server.
//!
//! Tests verify:
//! - Images are requested with the browser user agent
//! - Non-success statuses and unreachable hosts become fetch errors
//! - Bodies over the size limit are rejected
//! - The full pipeline works over real HTTP

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{header::USER_AGENT, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use img2color::error::FetchError;
use img2color::fetch::{HttpFetcher, ImageFetcher, BROWSER_USER_AGENT};
use img2color::store::ColorStore;

use super::test_utils::{
    api_uri, get_request, json_body, memory_store, red_png, send, test_router, ALLOWED_REFERER,
};

// =============================================================================
// Local Image Server
// =============================================================================

async fn red_png_handler() -> impl IntoResponse {
    ([("content-type", "image/png")], red_png())
}

async fn user_agent_handler(headers: HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Start a server that answers every connection with a chunked body of
/// `chunks` chunks of 1024 bytes and no `Content-Length`.
async fn spawn_chunked_server(chunks: usize) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let mut response =
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
                    .to_vec();
            for _ in 0..chunks {
                response.extend_from_slice(b"400\r\n");
                response.extend_from_slice(&[7u8; 1024]);
                response.extend_from_slice(b"\r\n");
            }
            response.extend_from_slice(b"0\r\n\r\n");
            let _ = socket.write_all(&response).await;
        }
    });
    addr
}

async fn slow_handler() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

/// Start a local server on an ephemeral port and return its address.
async fn spawn_image_server() -> SocketAddr {
    let app = Router::new()
        .route("/red.png", get(red_png_handler))
        .route("/ua", get(user_agent_handler))
        .route("/slow", get(slow_handler))
        .route("/gone", get(|| async { StatusCode::GONE }))
        .route("/big", get(|| async { vec![0u8; 4096] }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// HttpFetcher
// =============================================================================

#[tokio::test]
async fn test_fetch_returns_body() {
    let addr = spawn_image_server().await;
    let fetcher = HttpFetcher::new().unwrap();

    let body = fetcher
        .fetch(&format!("http://{}/red.png", addr))
        .await
        .unwrap();
    assert_eq!(body.as_ref(), red_png().as_slice());
}

#[tokio::test]
async fn test_fetch_sends_browser_user_agent() {
    let addr = spawn_image_server().await;
    let fetcher = HttpFetcher::new().unwrap();

    let body = fetcher.fetch(&format!("http://{}/ua", addr)).await.unwrap();
    assert_eq!(body.as_ref(), BROWSER_USER_AGENT.as_bytes());
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let addr = spawn_image_server().await;
    let fetcher = HttpFetcher::new().unwrap();

    let err = fetcher
        .fetch(&format!("http://{}/gone", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 410, .. }), "{:?}", err);

    let err = fetcher
        .fetch(&format!("http://{}/does-not-exist", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }), "{:?}", err);
}

#[tokio::test]
async fn test_fetch_timeout() {
    let addr = spawn_image_server().await;
    let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();

    let err = fetcher
        .fetch(&format!("http://{}/slow", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Request(_)), "{:?}", err);
}

#[tokio::test]
async fn test_fetch_rejects_oversized_content_length() {
    let addr = spawn_image_server().await;
    let url = format!("http://{}/big", addr);

    let fetcher = HttpFetcher::new().unwrap().with_max_body_bytes(1024);
    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(
        matches!(err, FetchError::TooLarge { limit: 1024, .. }),
        "{:?}",
        err
    );

    // A limit equal to the body size is accepted
    let fetcher = HttpFetcher::new().unwrap().with_max_body_bytes(4096);
    assert_eq!(fetcher.fetch(&url).await.unwrap().len(), 4096);
}

#[tokio::test]
async fn test_fetch_rejects_oversized_chunked_body() {
    let addr = spawn_chunked_server(8).await;
    let url = format!("http://{}/stream", addr);

    let fetcher = HttpFetcher::new().unwrap().with_max_body_bytes(3000);
    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::TooLarge { .. }), "{:?}", err);

    let fetcher = HttpFetcher::new().unwrap().with_max_body_bytes(8 * 1024);
    let body = fetcher.fetch(&url).await.unwrap();
    assert_eq!(body.len(), 8 * 1024);
    assert!(body.iter().all(|&b| b == 7));
}

#[tokio::test]
async fn test_fetch_rejects_non_http_urls() {
    let fetcher = HttpFetcher::new().unwrap();

    for url in ["ftp://example.com/a.png", "file:///etc/passwd", "not a url"] {
        let err = fetcher.fetch(url).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }), "{}: {:?}", url, err);
    }
}

// =============================================================================
// End to End
// =============================================================================

#[tokio::test]
async fn test_end_to_end_over_http() {
    let addr = spawn_image_server().await;
    let image_url = format!("http://{}/red.png", addr);
    let router = test_router(HttpFetcher::new().unwrap(), memory_store());

    let response = send(&router, get_request(&api_uri(&image_url), Some(ALLOWED_REFERER))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["RGB"], "#ff0000");
}

#[tokio::test]
async fn test_end_to_end_upstream_error() {
    let addr = spawn_image_server().await;
    let image_url = format!("http://{}/gone", addr);
    let router = test_router(HttpFetcher::new().unwrap(), ColorStore::new());

    let response = send(&router, get_request(&api_uri(&image_url), Some(ALLOWED_REFERER))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"], "fetch_error");
    assert!(body["message"].as_str().unwrap().contains("410"));
}
