//! Router configuration for img2color.
//!
//! This module defines the HTTP routes and applies middleware for the referer
//! gate, CORS headers and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health      GET       - Health check (public)
//! /api         GET       - Dominant color (referer-gated)
//! /api         OPTIONS   - Preflight (public)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use img2color::color::ColorService;
//! use img2color::fetch::HttpFetcher;
//! use img2color::server::referer::AllowList;
//! use img2color::server::routes::{create_router, RouterConfig};
//! use img2color::store::ColorStore;
//!
//! let service = ColorService::new(HttpFetcher::new()?, ColorStore::new());
//! let config = RouterConfig::new(AllowList::parse("*.example.com")?);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue,
    },
    middleware,
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{color_handler, health_handler, preflight_handler, AppState};
use super::referer::{referer_middleware, AllowList};
use crate::color::ColorService;
use crate::fetch::ImageFetcher;

/// Value of `Access-Control-Allow-Origin` on every response.
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// Value of `Access-Control-Allow-Methods` on every response.
pub const CORS_ALLOW_METHODS: &str = "GET, OPTIONS";

/// Value of `Access-Control-Allow-Headers` on every response.
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Referer";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Referer patterns allowed to call the color endpoint
    pub allow_list: AllowList,

    /// Hide fetch/decode detail in 500 responses
    pub redact_errors: bool,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration with the given allow-list.
    ///
    /// By default:
    /// - Error detail is passed through to callers
    /// - Tracing is enabled
    pub fn new(allow_list: AllowList) -> Self {
        Self {
            allow_list,
            redact_errors: false,
            enable_tracing: true,
        }
    }

    /// Enable or disable error redaction.
    pub fn with_redacted_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (health check, preflight)
/// - The referer-gated color route
/// - Fixed CORS headers on every response
/// - Request tracing (optional)
///
/// # Arguments
///
/// * `color_service` - The color service for handling requests
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<F>(color_service: ColorService<F>, config: RouterConfig) -> Router
where
    F: ImageFetcher + 'static,
{
    let app_state = AppState::new(color_service).with_redacted_errors(config.redact_errors);

    // The gate lets OPTIONS through, so preflight can share the route.
    let api_routes = Router::new()
        .route(
            "/api",
            get(color_handler::<F>).options(preflight_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            config.allow_list.clone(),
            referer_middleware,
        ))
        .with_state(app_state);

    let public_routes = Router::new().route("/health", get(health_handler));

    let router = Router::new()
        .merge(api_routes)
        .merge(public_routes)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(CORS_ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ));

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
