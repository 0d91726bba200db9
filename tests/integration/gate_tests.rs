//! Referer gate integration tests.
//!
//! Tests verify:
//! - Allowed referers reach the handler
//! - Missing and disallowed referers are rejected before any fetch
//! - An empty allow-list rejects everything
//! - Preflight requests bypass the gate

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;

use img2color::store::ColorStore;
use img2color::{create_router, AllowList, ColorService, RouterConfig};

use super::test_utils::{
    api_uri, calls, get_request, header, json_body, red_png, send, test_router, CountingFetcher,
};

const RED_URL: &str = "https://img.example.com/red.png";

// =============================================================================
// Allowed Referers
// =============================================================================

#[tokio::test]
async fn test_matching_referers_are_served() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let router = test_router(fetcher, ColorStore::new());

    for referer in [
        "https://blog.example.com/",
        "https://blog.example.com/posts/2024/colors",
        "cdn.trusted.io",
        "a.b.trusted.io",
    ] {
        let response = send(&router, get_request(&api_uri(RED_URL), Some(referer))).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", referer);
    }
}

// =============================================================================
// Rejected Referers
// =============================================================================

#[tokio::test]
async fn test_disallowed_referer_is_forbidden() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, ColorStore::new());

    for referer in [
        "https://evil.example.net/",
        "http://blog.example.com/",
        "https://blog.example.com",
        "trusted.io",
        "cdn.trusted.io.evil.net",
    ] {
        let response = send(&router, get_request(&api_uri(RED_URL), Some(referer))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", referer);

        let body = json_body(response).await;
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "Referer not allowed");
    }

    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_missing_referer_is_forbidden() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, ColorStore::new());

    let response = send(&router, get_request(&api_uri(RED_URL), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_gate_runs_before_parameter_validation() {
    let router = test_router(CountingFetcher::new(), ColorStore::new());

    // No img parameter, but the referer check comes first
    let response = send(&router, get_request("/api", Some("https://evil.example.net/"))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_allow_list_rejects_everything() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let service = ColorService::new(fetcher, ColorStore::new());
    let router = create_router(
        service,
        RouterConfig::new(AllowList::parse("").unwrap()).with_tracing(false),
    );

    for referer in [None, Some(""), Some("https://blog.example.com/")] {
        let response = send(&router, get_request(&api_uri(RED_URL), referer)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{:?}", referer);
    }
}

#[tokio::test]
async fn test_health_is_not_gated() {
    let router = test_router(CountingFetcher::new(), ColorStore::new());

    let response = send(&router, get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Preflight
// =============================================================================

#[tokio::test]
async fn test_preflight_bypasses_gate() {
    let fetcher = CountingFetcher::new();
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, ColorStore::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(api_uri(RED_URL))
        .header("referer", "https://evil.example.net/")
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(
        header(&response, "access-control-allow-methods"),
        Some("GET, OPTIONS")
    );
    assert_eq!(
        header(&response, "access-control-allow-headers"),
        Some("Content-Type, Referer")
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_preflight_without_referer_or_params() {
    let router = test_router(CountingFetcher::new(), ColorStore::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api")
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}
