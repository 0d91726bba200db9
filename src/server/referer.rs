//! Referer-based access gate.
//!
//! Every `GET` request must carry a `Referer` header matching one of the
//! configured patterns before any work is done.
//!
//! # Pattern Syntax
//!
//! - `*` matches any substring, including the empty one
//! - every other character matches itself literally, `.` included
//! - a pattern must match the whole referer, not a substring of it
//!
//! ```text
//! *.example.com      matches  a.example.com, foo.bar.example.com
//!                    rejects  example.com, a.example.com.evil.net
//! https://blog.io/*  matches  https://blog.io/, https://blog.io/post/1
//! ```
//!
//! # Fail-Closed Default
//!
//! An empty allow-list rejects every request, including requests with no
//! `Referer` header.
//!
//! # Example
//!
//! ```rust
//! use img2color::server::referer::AllowList;
//!
//! let allow = AllowList::parse("*.example.com, https://blog.io/*").unwrap();
//! assert!(allow.is_allowed("a.example.com"));
//! assert!(!allow.is_allowed("example.com"));
//!
//! let empty = AllowList::empty();
//! assert!(!empty.is_allowed(""));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::REFERER, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use tracing::warn;

use super::handlers::ErrorResponse;
use crate::error::ConfigError;

// =============================================================================
// Patterns
// =============================================================================

/// A single compiled referer pattern.
#[derive(Debug, Clone)]
pub struct RefererPattern {
    source: String,
    regex: Regex,
}

impl RefererPattern {
    /// Compile a wildcard pattern into an anchored matcher.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        // (?s) so `*` also spans newlines; the header value is matched whole.
        let regex = Regex::new(&format!("(?s)^{}$", body)).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `referer` satisfies this pattern as a whole.
    pub fn matches(&self, referer: &str) -> bool {
        self.regex.is_match(referer)
    }
}

// =============================================================================
// Allow-List
// =============================================================================

/// Ordered, immutable list of referer patterns.
///
/// Built once at startup and shared read-only across requests.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    patterns: Arc<Vec<RefererPattern>>,
}

impl AllowList {
    /// An allow-list that rejects everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a list of patterns. Blank entries are skipped.
    pub fn new<I, P>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| RefererPattern::new(&p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns: Arc::new(patterns),
        })
    }

    /// Parse a comma-separated pattern list, trimming whitespace around each
    /// entry.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(','))
    }

    /// Check whether a request with this `Referer` value may proceed.
    ///
    /// Patterns are tried in order and the first match allows the request.
    /// Always `false` when the list is empty.
    pub fn is_allowed(&self, referer: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        self.patterns.iter().any(|p| p.matches(referer))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterate over the configured patterns in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(RefererPattern::as_str)
    }
}

// =============================================================================
// Rejection
// =============================================================================

/// The request's referer did not match the allow-list.
#[derive(Debug, Clone)]
pub struct GateRejected {
    /// The referer that was presented (empty when the header was absent)
    pub referer: String,
}

impl std::fmt::Display for GateRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Referer not allowed")
    }
}

impl std::error::Error for GateRejected {}

impl IntoResponse for GateRejected {
    fn into_response(self) -> Response {
        let status = StatusCode::FORBIDDEN;
        let error_type = "forbidden";
        let message = self.to_string();

        warn!(
            error_type = error_type,
            status = status.as_u16(),
            referer = %self.referer,
            "Access denied: {}",
            message
        );

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware enforcing the referer allow-list.
///
/// `OPTIONS` requests pass through untouched so that preflight always
/// succeeds. A missing or non-UTF-8 `Referer` header is checked as the empty
/// string.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::get};
/// use img2color::server::referer::{AllowList, referer_middleware};
///
/// let allow = AllowList::parse("*.example.com")?;
/// let app = Router::new()
///     .route("/api", get(color_handler))
///     .route_layer(middleware::from_fn_with_state(allow, referer_middleware));
/// ```
pub async fn referer_middleware(
    State(allow): State<AllowList>,
    request: Request,
    next: Next,
) -> Result<Response, GateRejected> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let referer = request
        .headers()
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !allow.is_allowed(referer) {
        return Err(GateRejected {
            referer: referer.to_string(),
        });
    }

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
