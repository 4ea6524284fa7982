//! Access cookie integration tests.
//!
//! Tests verify:
//! - Valid cookies with a matching role unlock restricted assets
//! - Expired, tampered and foreign-customer cookies are rejected
//! - Missing cookies are rejected unless the size shortcut applies
//! - Open assets ignore cookies entirely

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use iiif_delivery_router::AccessTokenSigner;

use super::test_utils::{body_json, cookie_app, get, image_path, CUSTOMER, ROLE, TEST_SECRET};

const COOKIE_NAME: &str = "dlcs-token-2";

fn roles(roles: &[&str]) -> Vec<String> {
    roles.iter().map(|r| r.to_string()).collect()
}

fn with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn restricted_full() -> String {
    image_path("restricted", "full/max/0/default.jpg")
}

// =============================================================================
// Valid Cookies
// =============================================================================

#[tokio::test]
async fn test_valid_cookie_succeeds() {
    let signer = AccessTokenSigner::new(TEST_SECRET);
    let value = signer.cookie_value(CUSTOMER, &roles(&[ROLE]), Duration::from_secs(3600));

    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}={}", COOKIE_NAME, value)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "private, max-age=600"
    );
    assert_eq!(
        response.headers().get("x-proxy-destination").unwrap(),
        "special_server"
    );
}

#[tokio::test]
async fn test_valid_cookie_among_others() {
    let signer = AccessTokenSigner::new(TEST_SECRET);
    let value = signer.cookie_value(
        CUSTOMER,
        &roles(&["staff", ROLE]),
        Duration::from_secs(3600),
    );

    let response = cookie_app()
        .oneshot(with_cookie(
            &restricted_full(),
            &format!("session=abc; {}={}; theme=dark", COOKIE_NAME, value),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Rejected Cookies
// =============================================================================

#[tokio::test]
async fn test_missing_cookie_rejected() {
    let response = cookie_app().oneshot(get(&restricted_full())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_expired_cookie_rejected() {
    let signer = AccessTokenSigner::new(TEST_SECRET);
    let expired_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        - 100;
    let value = signer.cookie_value_with_expiry(CUSTOMER, &roles(&[ROLE]), expired_time);

    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}={}", COOKIE_NAME, value)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let signer = AccessTokenSigner::new("some-other-secret");
    let value = signer.cookie_value(CUSTOMER, &roles(&[ROLE]), Duration::from_secs(3600));

    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}={}", COOKIE_NAME, value)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_escalation_rejected() {
    let signer = AccessTokenSigner::new(TEST_SECRET);
    let value = signer.cookie_value(CUSTOMER, &roles(&["visitor"]), Duration::from_secs(3600));
    let tampered = value.replacen("roles=visitor", &format!("roles={}", ROLE), 1);
    assert_ne!(value, tampered);

    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}={}", COOKIE_NAME, tampered)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_matching_role_rejected() {
    let signer = AccessTokenSigner::new(TEST_SECRET);
    let value = signer.cookie_value(CUSTOMER, &roles(&["visitor"]), Duration::from_secs(3600));

    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}={}", COOKIE_NAME, value)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cookie_for_other_customer_rejected() {
    let signer = AccessTokenSigner::new(TEST_SECRET);
    let value = signer.cookie_value(99, &roles(&[ROLE]), Duration::from_secs(3600));

    // Right cookie name, signed for another customer
    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}={}", COOKIE_NAME, value)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Other customer's cookie name
    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("dlcs-token-99={}", value)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_cookie_rejected() {
    let response = cookie_app()
        .oneshot(with_cookie(&restricted_full(), &format!("{}=not-a-token", COOKIE_NAME)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Requests Not Needing a Cookie
// =============================================================================

#[tokio::test]
async fn test_small_restricted_rendition_without_cookie() {
    let response = cookie_app()
        .oneshot(get(&image_path("restricted", "full/!200,200/0/default.jpg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-proxy-destination").unwrap(), "thumbs");
}

#[tokio::test]
async fn test_open_asset_ignores_bad_cookie() {
    let response = cookie_app()
        .oneshot(with_cookie(
            &image_path("test-image", "0,0,512,512/512,/0/default.jpg"),
            &format!("{}=not-a-token", COOKIE_NAME),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
