//! HTTP request handlers for the color API.
//!
//! # Endpoints
//!
//! - `GET /api?img=<url>` - Dominant color of an image
//! - `OPTIONS /api` - Preflight, always 200
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::color::{ColorService, ColorValue};
use crate::error::ColorError;
use crate::fetch::ImageFetcher;

/// Header reporting whether the color was served from the volatile tier.
pub const CACHE_HIT_HEADER: &str = "X-Color-Cache-Hit";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the color service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<F: ImageFetcher> {
    /// The color service for processing requests
    pub color_service: Arc<ColorService<F>>,

    /// Replace fetch/decode detail in 500 responses with a generic message
    pub redact_errors: bool,
}

impl<F: ImageFetcher> AppState<F> {
    /// Create a new application state with the given color service.
    pub fn new(color_service: ColorService<F>) -> Self {
        Self {
            color_service: Arc::new(color_service),
            redact_errors: false,
        }
    }

    /// Hide internal error detail from callers.
    pub fn with_redacted_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }
}

impl<F: ImageFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            color_service: Arc::clone(&self.color_service),
            redact_errors: self.redact_errors,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for color requests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ColorQueryParams {
    /// Image URL. Missing and empty are treated the same.
    pub img: Option<String>,
}

impl ColorQueryParams {
    /// Parse a raw query string.
    ///
    /// Unknown keys are ignored. When `img` is repeated, the first value
    /// wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let img = query.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "img")
                .map(|(_, value)| value.into_owned())
        });
        Self { img }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "forbidden", "missing_parameter")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Successful color response: `{"RGB": "#rrggbb"}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorBody {
    #[serde(rename = "RGB")]
    pub rgb: ColorValue,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Map a color error to status, error type and caller-facing message.
fn describe_error(err: &ColorError, redact: bool) -> (StatusCode, &'static str, String) {
    match err {
        ColorError::MissingImage => (
            StatusCode::BAD_REQUEST,
            "missing_parameter",
            err.to_string(),
        ),
        ColorError::Fetch(_) if redact => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "fetch_error",
            "Failed to fetch image".to_string(),
        ),
        ColorError::Fetch(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "fetch_error",
            err.to_string(),
        ),
        ColorError::Decode(_) if redact => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "decode_error",
            "Failed to decode image".to_string(),
        ),
        ColorError::Decode(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "decode_error",
            err.to_string(),
        ),
    }
}

/// Build the HTTP response for a color error.
///
/// 4xx errors are logged at WARN, 5xx at ERROR. The log line always carries
/// the full error, even when the response body is redacted.
fn error_response(err: &ColorError, redact: bool) -> Response {
    let (status, error_type, message) = describe_error(err, redact);

    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            err
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            err
        );
    }

    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

/// Convert ColorError to HTTP response, with full detail.
impl IntoResponse for ColorError {
    fn into_response(self) -> Response {
        error_response(&self, false)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle color requests.
///
/// # Endpoint
///
/// `GET /api?img=<url>`
///
/// # Response
///
/// - `200 OK`: `{"RGB": "#rrggbb"}` with `Content-Type: application/json`
/// - `400 Bad Request`: `img` missing or empty
/// - `403 Forbidden`: referer not allowed (rejected by the gate middleware)
/// - `500 Internal Server Error`: image could not be fetched or decoded
///
/// # Headers
///
/// - `X-Color-Cache-Hit: true|false`
pub async fn color_handler<F: ImageFetcher>(
    State(state): State<AppState<F>>,
    RawQuery(query): RawQuery,
) -> Response {
    let url = ColorQueryParams::from_query(query.as_deref())
        .img
        .unwrap_or_default();

    match state.color_service.get_color(&url).await {
        Ok(response) => (
            StatusCode::OK,
            [(CACHE_HIT_HEADER, response.cache_hit.to_string())],
            Json(ColorBody {
                rgb: response.color,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err, state.redact_errors),
    }
}

/// Handle preflight requests.
///
/// # Endpoint
///
/// `OPTIONS /api`
///
/// Always `200 OK` with an empty body; CORS headers are added by the router.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
