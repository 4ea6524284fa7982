//! API integration tests for the HTTP surface.
//!
//! Tests verify:
//! - Proxy decisions become 200 responses with forwarding headers
//! - Terminal outcomes become JSON error responses
//! - Collaborator failures map to 5xx
//! - CORS origin handling
//! - Health endpoint

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use iiif_delivery_router::error::AccessError;
use iiif_delivery_router::{
    create_router, AssetAccessResult, ImageRequestRouter, ImageServerPathConfig, RouterConfig,
    RoutingSettings,
};

use super::test_utils::{
    body_json, fixed_app, get, image_path, test_router, test_store, CountingValidator,
    UnavailableTracker,
};

fn open_app() -> axum::Router {
    fixed_app(CountingValidator::new(AssetAccessResult::Open))
}

// =============================================================================
// Proxy Responses
// =============================================================================

#[tokio::test]
async fn test_thumb_request_returns_redirect() {
    let response = open_app()
        .oneshot(get(&image_path("test-image", "full/!150,150/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-accel-redirect").unwrap(),
        "/thumbs/2/2/test-image/full/!150,150/0/default.jpg"
    );
    assert_eq!(response.headers().get("x-proxy-destination").unwrap(), "thumbs");
    assert_eq!(response.headers().get("x-test-header").unwrap(), "space");
    assert!(response.headers().get("cache-control").is_none());

    let json = body_json(response).await;
    assert_eq!(json["destination"], "thumbs");
    assert_eq!(json["path"], "thumbs/2/2/test-image/full/!150,150/0/default.jpg");
    assert_eq!(json["headers"]["x-other"], "other");
}

#[tokio::test]
async fn test_tile_request_returns_image_server_decision() {
    let response = open_app()
        .oneshot(get(&image_path("test-image", "0,0,512,512/512,/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-proxy-destination").unwrap(),
        "image_server"
    );
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, s-maxage=2419200, max-age=2419200, stale-if-error=86400"
    );

    let json = body_json(response).await;
    assert_eq!(json["destination"], "image_server");
    assert_eq!(
        json["path"],
        "cantaloupe/iiif/3/2%2F2%2Fte%2Fst%2F-i%2Fma%2Ftest-image/0,0,512,512/512,/0/default.jpg"
    );
}

#[tokio::test]
async fn test_full_request_returns_special_server_decision() {
    let response = open_app()
        .oneshot(get(&image_path("test-image", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-accel-redirect").unwrap(),
        "/special_server/cantaloupe/iiif/3/s3:%2F%2Fstorage%2F2%2F2%2Ftest-image/full/max/0/default.jpg"
    );
}

#[tokio::test]
async fn test_percent_encoded_path_is_decoded() {
    let response = open_app()
        .oneshot(get(
            "/iiif-img/test-customer/2/test-image/full/%21150%2C150/0/default.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-proxy-destination").unwrap(), "thumbs");
}

#[tokio::test]
async fn test_query_string_is_ignored() {
    let response = open_app()
        .oneshot(get(&format!(
            "{}?cache-bust=1",
            image_path("test-image", "full/max/0/default.jpg")
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-proxy-destination").unwrap(),
        "special_server"
    );
}

#[tokio::test]
async fn test_head_request() {
    let request = Request::builder()
        .method(Method::HEAD)
        .uri(image_path("test-image", "full/max/0/default.jpg"))
        .body(Body::empty())
        .unwrap();

    let response = open_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-accel-redirect"));
}

// =============================================================================
// Terminal Responses
// =============================================================================

#[tokio::test]
async fn test_not_found_response() {
    let response = open_app()
        .oneshot(get(&image_path("file-only", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-accel-redirect").is_none());

    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_unknown_customer_response() {
    let response = open_app()
        .oneshot(get("/iiif-img/nobody/2/test-image/full/max/0/default.jpg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_request_response() {
    let response = open_app()
        .oneshot(get(&image_path("test-image", "full/max/720/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_unsupported_version_response() {
    let response = open_app()
        .oneshot(get(
            "/iiif-img/v1/test-customer/2/test-image/full/max/0/default.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unauthorized_response() {
    let validator = CountingValidator::new(AssetAccessResult::Unauthorized);
    let response = fixed_app(validator.clone())
        .oneshot(get(&image_path("restricted", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(validator.calls(), 1);

    let json = body_json(response).await;
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_unmatched_route() {
    let response = open_app().oneshot(get("/iiif-av/2/2/a")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Collaborator Failures
// =============================================================================

#[tokio::test]
async fn test_tracker_unavailable_is_bad_gateway() {
    let store = Arc::new(test_store());
    let router = ImageRequestRouter::new(
        store.clone(),
        Arc::new(UnavailableTracker),
        store,
        Arc::new(CountingValidator::new(AssetAccessResult::Open)),
        RoutingSettings::default(),
    );
    let app = create_router(router, RouterConfig::new().with_tracing(false));

    let response = app
        .oneshot(get(&image_path("test-image", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "store_unavailable");
}

#[tokio::test]
async fn test_validator_unavailable_is_bad_gateway() {
    let validator = CountingValidator::failing(AccessError::Unavailable("timeout".to_string()));
    let response = fixed_app(validator)
        .oneshot(get(&image_path("restricted", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validator_unavailable");
}

#[tokio::test]
async fn test_validator_cancelled_is_service_unavailable() {
    let validator = CountingValidator::failing(AccessError::Cancelled);
    let response = fixed_app(validator)
        .oneshot(get(&image_path("restricted", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"], "request_cancelled");
}

#[tokio::test]
async fn test_misconfigured_backend_is_internal_error() {
    let settings = RoutingSettings::new(ImageServerPathConfig::empty());
    let router = ImageRequestRouter::new(
        Arc::new(test_store()),
        Arc::new(test_store()),
        Arc::new(test_store()),
        Arc::new(CountingValidator::new(AssetAccessResult::Open)),
        settings,
    );
    let app = create_router(router, RouterConfig::new().with_tracing(false));

    let response = app
        .oneshot(get(&image_path("test-image", "full/max/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "misconfigured");
}

// =============================================================================
// CORS
// =============================================================================

fn cors_app(config: RouterConfig) -> axum::Router {
    create_router(
        test_router(Arc::new(CountingValidator::new(AssetAccessResult::Open))),
        config.with_tracing(false),
    )
}

fn from_origin(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_any_origin() {
    let response = cors_app(RouterConfig::new())
        .oneshot(from_origin(
            &image_path("test-image", "full/max/0/default.jpg"),
            "https://viewer.example.com",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_configured_origins() {
    let config = RouterConfig::new().with_cors_origins(vec![
        "https://viewer.example.com".to_string(),
        "https://other.example.com".to_string(),
    ]);

    let response = cors_app(config.clone())
        .oneshot(from_origin("/health", "https://viewer.example.com"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://viewer.example.com"
    );

    let response = cors_app(config)
        .oneshot(from_origin("/health", "https://evil.example.com"))
        .await
        .unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_cors_empty_origin_list_allows_none() {
    let response = cors_app(RouterConfig::new().with_cors_origins(vec![]))
        .oneshot(from_origin("/health", "https://viewer.example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(
        test_router(Arc::new(CountingValidator::new(AssetAccessResult::Open))),
        RouterConfig::new(),
    );

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}
