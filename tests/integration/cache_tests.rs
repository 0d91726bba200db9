//! Cache effectiveness integration tests.
//!
//! Tests verify:
//! - Repeated URLs are answered from the volatile tier without refetching
//! - Distinct URLs never share an entry
//! - Tier outages degrade to recomputation instead of failing requests
//! - The durable tier records the literal URL and its color

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use img2color::store::{ColorStore, Fingerprint, MemoryTier, VolatileTier};

use super::test_utils::{
    api_uri, calls, get_request, header, json_body, memory_store, red_png, send, test_router,
    CountingFetcher, RecordingDurable, UnavailableDurable, UnavailableVolatile, ALLOWED_REFERER,
};

const RED_URL: &str = "https://img.example.com/red.png";

// =============================================================================
// Volatile Tier Effectiveness
// =============================================================================

#[tokio::test]
async fn test_second_request_is_cache_hit() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, memory_store());

    // First request - cache miss
    let response1 = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
    assert_eq!(response1.status(), StatusCode::OK);
    assert_eq!(header(&response1, "x-color-cache-hit"), Some("false"));
    let body1 = json_body(response1).await;

    // Second request - cache hit
    let response2 = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
    assert_eq!(response2.status(), StatusCode::OK);
    assert_eq!(header(&response2, "x-color-cache-hit"), Some("true"));
    let body2 = json_body(response2).await;

    assert_eq!(body1, body2);
    assert_eq!(calls(&counter), 1);
}

#[tokio::test]
async fn test_precomputed_entry_skips_fetch() {
    let tier = Arc::new(MemoryTier::new());
    tier.set(&Fingerprint::of(RED_URL), "#123456", Duration::from_secs(60))
        .await
        .unwrap();

    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, ColorStore::new().with_volatile(tier));

    let response = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["RGB"], "#123456");
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_malformed_cached_value_is_recomputed() {
    let tier = Arc::new(MemoryTier::new());
    tier.set(&Fingerprint::of(RED_URL), "not-a-color", Duration::from_secs(60))
        .await
        .unwrap();

    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, ColorStore::new().with_volatile(tier.clone()));

    let response = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-color-cache-hit"), Some("false"));
    assert_eq!(json_body(response).await["RGB"], "#ff0000");
    assert_eq!(calls(&counter), 1);

    // The recomputed color replaced the bad entry
    let stored = tier.get(&Fingerprint::of(RED_URL)).await.unwrap();
    assert_eq!(stored.as_deref(), Some("#ff0000"));
}

#[tokio::test]
async fn test_distinct_urls_are_cached_separately() {
    let other = "https://img.example.com/red.png?v=2";
    let fetcher = CountingFetcher::new()
        .with_body(RED_URL, red_png())
        .with_body(other, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, memory_store());

    for url in [RED_URL, other, RED_URL, other] {
        let response = send(&router, get_request(&api_uri(url), Some(ALLOWED_REFERER))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(calls(&counter), 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let fetcher = CountingFetcher::new();
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, memory_store());

    let url = "https://img.example.com/missing.png";
    for _ in 0..2 {
        let response = send(&router, get_request(&api_uri(url), Some(ALLOWED_REFERER))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert_eq!(calls(&counter), 2);
}

#[tokio::test]
async fn test_concurrent_requests_all_succeed() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let router = test_router(fetcher, memory_store());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let response =
                send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
            (response.status(), json_body(response).await)
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["RGB"], "#ff0000");
    }

    // Concurrent misses may each compute, but never more than once per request
    let fetched = calls(&counter);
    assert!((1..=8).contains(&fetched));
}

// =============================================================================
// Tier Outages
// =============================================================================

#[tokio::test]
async fn test_volatile_outage_degrades_to_recompute() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let store = ColorStore::new().with_volatile(Arc::new(UnavailableVolatile));
    let router = test_router(fetcher, store);

    for _ in 0..2 {
        let response = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "x-color-cache-hit"), Some("false"));
        assert_eq!(json_body(response).await["RGB"], "#ff0000");
    }

    assert_eq!(calls(&counter), 2);
}

#[tokio::test]
async fn test_durable_outage_does_not_fail_request() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let store = memory_store().with_durable(Arc::new(UnavailableDurable));
    let router = test_router(fetcher, store);

    let response = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["RGB"], "#ff0000");
}

// =============================================================================
// Durable Tier Records
// =============================================================================

#[tokio::test]
async fn test_durable_tier_records_literal_url() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let durable = Arc::new(RecordingDurable::default());
    let store = memory_store().with_durable(durable.clone());
    let router = test_router(fetcher, store);

    for _ in 0..3 {
        let response = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Only the miss writes, and the record is keyed by the URL itself
    assert_eq!(
        durable.records(),
        vec![(RED_URL.to_string(), "#ff0000".to_string())]
    );
}

#[tokio::test]
async fn test_durable_tier_without_volatile_upserts_each_time() {
    let fetcher = CountingFetcher::new().with_body(RED_URL, red_png());
    let counter = fetcher.call_counter();
    let durable = Arc::new(RecordingDurable::default());
    let router = test_router(fetcher, ColorStore::new().with_durable(durable.clone()));

    for _ in 0..2 {
        let response = send(&router, get_request(&api_uri(RED_URL), Some(ALLOWED_REFERER))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Reads never consult the durable tier
    assert_eq!(calls(&counter), 2);
    assert_eq!(durable.records().len(), 1);
}
