//! HTTP server layer for img2color.
//!
//! This module provides the HTTP API for computing image colors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                      GET /api?img=<url>                         │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   referer   │  │        routes           │  │
//! │  │ (requests)  │  │ (allow-list)│  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod referer;
pub mod routes;

pub use handlers::{
    color_handler, health_handler, preflight_handler, AppState, ColorBody, ColorQueryParams,
    ErrorResponse, HealthResponse, CACHE_HIT_HEADER,
};
pub use referer::{referer_middleware, AllowList, GateRejected, RefererPattern};
pub use routes::{
    create_router, RouterConfig, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN,
};
