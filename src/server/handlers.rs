//! HTTP request handlers for the IIIF delivery router.
//!
//! # Endpoints
//!
//! - `GET /iiif-img/{*path}` - Route an IIIF Image API request
//! - `GET /health` - Health check endpoint

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::asset::RequestCredentials;
use crate::error::{AccessError, DeliveryError, LookupError};
use crate::routing::{ImageRequestRouter, ProxyAction, ProxyDestination, RoutingOutcome, TerminalStatus};

/// Header carrying the internal redirect for the forwarding tier.
pub const X_ACCEL_REDIRECT: &str = "x-accel-redirect";

/// Header naming the selected destination.
pub const X_PROXY_DESTINATION: &str = "x-proxy-destination";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the image request router.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState {
    /// Routes image requests to a destination
    pub router: Arc<ImageRequestRouter>,
}

impl AppState {
    pub fn new(router: ImageRequestRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "bad_request")
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

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Body of a proxy decision.
#[derive(Debug, Serialize)]
pub struct ProxyActionResponse {
    pub destination: ProxyDestination,

    /// Downstream path
    pub path: String,

    /// Headers to merge into the proxied response
    pub headers: BTreeMap<String, String>,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn log_by_severity(status: StatusCode, error_type: &str, message: &str) {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        // Common and expected
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }
}

fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    log_by_severity(status, error_type, &message);
    let body = ErrorResponse::with_status(error_type, message, status);
    (status, Json(body)).into_response()
}

/// Convert a collaborator failure to an HTTP response.
///
/// - Store or validator unreachable: 502
/// - Request cancelled while validating: 503
/// - Router misconfigured, or a store returned garbage: 500
impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            DeliveryError::Tracker(LookupError::Unavailable(_))
            | DeliveryError::Headers(LookupError::Unavailable(_)) => {
                (StatusCode::BAD_GATEWAY, "store_unavailable")
            }
            DeliveryError::Tracker(LookupError::InvalidRecord(_))
            | DeliveryError::Headers(LookupError::InvalidRecord(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_record")
            }
            DeliveryError::Access(AccessError::Unavailable(_)) => {
                (StatusCode::BAD_GATEWAY, "validator_unavailable")
            }
            DeliveryError::Access(AccessError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "request_cancelled")
            }
            DeliveryError::Misconfigured(_) => (StatusCode::INTERNAL_SERVER_ERROR, "misconfigured"),
        };

        error_response(status, error_type, self.to_string())
    }
}

/// Convert a terminal routing decision to an HTTP response.
impl IntoResponse for TerminalStatus {
    fn into_response(self) -> Response {
        let (error_type, message) = match self {
            TerminalStatus::NotFound => ("not_found", "Image not found"),
            TerminalStatus::BadRequest => ("bad_request", "Unable to handle image request"),
            TerminalStatus::Unauthorized => ("unauthorized", "Not authorised to view image"),
        };
        error_response(self.status_code(), error_type, message.to_string())
    }
}

/// Convert a proxy decision to an HTTP response for the forwarding tier.
///
/// Computed headers are set on the response alongside `X-Accel-Redirect`
/// and `X-Proxy-Destination`; the JSON body repeats the decision.
impl IntoResponse for ProxyAction {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %key, "Skipping header that is not valid HTTP"),
            }
        }

        match HeaderValue::from_str(&self.redirect_location()) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(X_ACCEL_REDIRECT), value);
            }
            Err(_) => warn!(path = %self.path, "Downstream path is not a valid header value"),
        }
        headers.insert(
            HeaderName::from_static(X_PROXY_DESTINATION),
            HeaderValue::from_static(self.destination.as_str()),
        );

        let body = ProxyActionResponse {
            destination: self.destination,
            path: self.path,
            headers: self.headers,
        };
        (StatusCode::OK, headers, Json(body)).into_response()
    }
}

impl IntoResponse for RoutingOutcome {
    fn into_response(self) -> Response {
        match self {
            RoutingOutcome::Status(status) => status.into_response(),
            RoutingOutcome::Proxy(action) => action.into_response(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle IIIF image requests.
///
/// # Endpoint
///
/// `GET /iiif-img/{version?}/{customer}/{space}/{asset}/{region}/{size}/{rotation}/{quality}.{format}`
///
/// # Response
///
/// - `200 OK`: proxy decision, with `X-Accel-Redirect` (see [`ProxyAction::redirect_location`])
/// - `400 Bad Request`: malformed path or version unsupported by the backend
/// - `401 Unauthorized`: restricted image and the caller lacks access
/// - `404 Not Found`: unknown customer or asset, or asset not deliverable
/// - `502`/`503`: a collaborator failed or the request was cancelled
///
/// The access check is cancelled if the client goes away.
pub async fn iiif_image_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<RoutingOutcome, DeliveryError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let credentials = RequestCredentials::from_cookie_headers(
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );

    state.router.route(uri.path(), &credentials, &cancel).await
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
