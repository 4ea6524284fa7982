//! Test utilities for integration tests.
//!
//! This module provides fake collaborators and a shared metadata snapshot
//! covering the asset shapes the router distinguishes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;

use iiif_delivery_router::error::{AccessError, LookupError};
use iiif_delivery_router::{
    create_router, AccessTokenSigner, AssetAccessResult, AssetAccessValidator, AssetId,
    AssetTracker, AuthMechanism, CookieAccessValidator, CustomHeaderRule, CustomHeaderStore,
    ImageRequestRouter, OrchestrationAsset, RequestCredentials, RouterConfig, RoutingSettings,
    StaticMetadataStore,
};

pub const TEST_SECRET: &str = "test-secret-key-for-hmac-signing";

/// Customer id and name used throughout the snapshot.
pub const CUSTOMER: u32 = 2;
pub const CUSTOMER_NAME: &str = "test-customer";
pub const SPACE: u32 = 2;

/// Role held by restricted assets.
pub const ROLE: &str = "clickthrough";

// =============================================================================
// Metadata Snapshot
// =============================================================================

/// Snapshot with one asset per routing case.
///
/// - `test-image`: open, 1000x1000, open thumbs 150 and 100
/// - `restricted`: clickthrough role, 1000x1000, max unauthorised 400
/// - `small-restricted`: clickthrough role, 300x200, max unauthorised 400
/// - `file-only`: file channel, no image channel
/// - `timebased-only`, `file-and-timebased`, `thumbs-only`: other channel
///   sets without the image channel
/// - `restricted-file`: clickthrough role, file channel only
/// - `not-stored`: no source, not reingestable
/// - `reingest`: no source, reingestable
/// - `orchestrated`: source already on image-server disk
pub const SNAPSHOT: &str = r#"{
    "customers": [{"id": 2, "name": "test-customer"}],
    "assets": [
        {"asset_id": "2/2/test-image", "channels": ["image", "thumbs"],
         "width": 1000, "height": 1000, "open_thumbs": [[150, 150], [100, 100]],
         "storage_location": "s3://storage/2/2/test-image"},
        {"asset_id": "2/2/restricted", "channels": ["image"],
         "requires_auth": true, "roles": ["clickthrough"], "max_unauthorised": 400,
         "width": 1000, "height": 1000, "open_thumbs": [[400, 400], [200, 200]],
         "storage_location": "s3://storage/2/2/restricted"},
        {"asset_id": "2/2/small-restricted", "channels": ["image"],
         "requires_auth": true, "roles": ["clickthrough"], "max_unauthorised": 400,
         "width": 300, "height": 200,
         "storage_location": "s3://storage/2/2/small-restricted"},
        {"asset_id": "2/2/file-only", "channels": ["file"],
         "width": 1000, "height": 1000,
         "storage_location": "s3://storage/2/2/file-only"},
        {"asset_id": "2/2/timebased-only", "channels": ["timebased"],
         "width": 1000, "height": 1000,
         "storage_location": "s3://storage/2/2/timebased-only"},
        {"asset_id": "2/2/file-and-timebased", "channels": ["file", "timebased"],
         "width": 1000, "height": 1000,
         "storage_location": "s3://storage/2/2/file-and-timebased"},
        {"asset_id": "2/2/thumbs-only", "channels": ["thumbs"],
         "width": 1000, "height": 1000, "open_thumbs": [[150, 150]],
         "storage_location": "s3://storage/2/2/thumbs-only"},
        {"asset_id": "2/2/restricted-file", "channels": ["file"],
         "requires_auth": true, "roles": ["clickthrough"], "max_unauthorised": 400,
         "width": 1000, "height": 1000,
         "storage_location": "s3://storage/2/2/restricted-file"},
        {"asset_id": "2/2/not-stored", "channels": ["image"],
         "width": 1000, "height": 1000},
        {"asset_id": "2/2/reingest", "channels": ["image"], "reingest": true,
         "width": 1000, "height": 1000},
        {"asset_id": "2/2/orchestrated", "channels": ["image"],
         "orchestration_status": "orchestrated",
         "width": 1000, "height": 1000,
         "storage_location": "s3://storage/2/2/orchestrated"}
    ],
    "custom_headers": [
        {"customer": 2, "key": "x-test-header", "value": "customer"},
        {"customer": 2, "space": 2, "key": "x-test-header", "value": "space"},
        {"customer": 2, "role": "clickthrough", "key": "x-test-header", "value": "role"},
        {"customer": 2, "key": "x-other", "value": "other"}
    ]
}"#;

pub fn test_store() -> StaticMetadataStore {
    StaticMetadataStore::from_json(SNAPSHOT).unwrap()
}

/// Request path for an asset in the test customer's space.
pub fn image_path(name: &str, trailer: &str) -> String {
    format!("/iiif-img/{}/{}/{}/{}", CUSTOMER_NAME, SPACE, name, trailer)
}

// =============================================================================
// Fake Validators
// =============================================================================

/// A validator returning a fixed result and counting its calls.
#[derive(Clone)]
pub struct CountingValidator {
    result: Result<AssetAccessResult, AccessError>,
    calls: Arc<AtomicUsize>,
}

impl CountingValidator {
    pub fn new(result: AssetAccessResult) -> Self {
        Self {
            result: Ok(result),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: AccessError) -> Self {
        Self {
            result: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetAccessValidator for CountingValidator {
    async fn validate(
        &self,
        _asset_id: &AssetId,
        _roles: &[String],
        _mechanism: AuthMechanism,
        _credentials: &RequestCredentials,
        _cancel: &CancellationToken,
    ) -> Result<AssetAccessResult, AccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// A validator that never finishes unless the request is cancelled.
pub struct HangingValidator;

#[async_trait]
impl AssetAccessValidator for HangingValidator {
    async fn validate(
        &self,
        _asset_id: &AssetId,
        _roles: &[String],
        _mechanism: AuthMechanism,
        _credentials: &RequestCredentials,
        cancel: &CancellationToken,
    ) -> Result<AssetAccessResult, AccessError> {
        cancel.cancelled().await;
        Err(AccessError::Cancelled)
    }
}

// =============================================================================
// Failing Stores
// =============================================================================

/// Asset tracker whose backing store is down.
pub struct UnavailableTracker;

#[async_trait]
impl AssetTracker for UnavailableTracker {
    async fn get_orchestration_asset(
        &self,
        _asset_id: &AssetId,
    ) -> Result<Option<OrchestrationAsset>, LookupError> {
        Err(LookupError::Unavailable("connection refused".to_string()))
    }
}

/// Header store whose backing store is down.
pub struct UnavailableHeaderStore;

#[async_trait]
impl CustomHeaderStore for UnavailableHeaderStore {
    async fn get_custom_headers(&self, _customer: u32) -> Result<Vec<CustomHeaderRule>, LookupError> {
        Err(LookupError::Unavailable("connection refused".to_string()))
    }
}

// =============================================================================
// Router Builders
// =============================================================================

/// Router over the snapshot with the given validator and default settings.
pub fn test_router(validator: Arc<dyn AssetAccessValidator>) -> ImageRequestRouter {
    test_router_with_settings(validator, RoutingSettings::default())
}

pub fn test_router_with_settings(
    validator: Arc<dyn AssetAccessValidator>,
    settings: RoutingSettings,
) -> ImageRequestRouter {
    let store = Arc::new(test_store());
    ImageRequestRouter::new(store.clone(), store.clone(), store, validator, settings)
}

/// HTTP app over the snapshot using signed access cookies.
pub fn cookie_app() -> axum::Router {
    let validator = CookieAccessValidator::new(AccessTokenSigner::new(TEST_SECRET));
    create_router(
        test_router(Arc::new(validator)),
        RouterConfig::new().with_tracing(false),
    )
}

/// HTTP app over the snapshot using a fixed-result validator.
pub fn fixed_app(validator: CountingValidator) -> axum::Router {
    create_router(
        test_router(Arc::new(validator)),
        RouterConfig::new().with_tracing(false),
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
