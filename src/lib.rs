//! # IIIF Delivery Router
//!
//! Delivery-time routing for IIIF Image API requests.
//!
//! For every inbound image request the router decides, before any pixels are
//! produced, whether the caller may see the requested rendition and which
//! backend should produce it: the pre-rendered thumbnail store, the tile image
//! server, or a dedicated pool for whole-image transforms. It then builds the
//! downstream path and the response headers for the forwarding tier.
//!
//! ## Features
//!
//! - **IIIF path grammar**: versioned and unversioned Image API paths
//! - **Size-bounded access shortcut**: small renditions of restricted images skip the auth round-trip
//! - **Backend path templates**: per-backend separators and version templates for Cantaloupe and IIPImage
//! - **Custom headers**: most specific rule per header key, by space and role
//! - **Access cookies**: HMAC-SHA256 signed, role-bearing cookies
//!
//! ## Architecture
//!
//! - [`iiif`] - IIIF Image API request grammar
//! - [`delivery`] - Delivery path parsing (prefix, version, customer, space, asset)
//! - [`asset`] - Asset model and the collaborator traits
//! - [`routing`] - Access gate, destination routing and header merging
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use iiif_delivery_router::{
//!     create_router, AccessTokenSigner, CookieAccessValidator, ImageRequestRouter, RouterConfig,
//!     RoutingSettings, StaticMetadataStore,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(StaticMetadataStore::from_file("metadata.json").unwrap());
//!     let validator = CookieAccessValidator::new(AccessTokenSigner::new("secret"));
//!
//!     let image_router = ImageRequestRouter::new(
//!         store.clone(),
//!         store.clone(),
//!         store,
//!         Arc::new(validator),
//!         RoutingSettings::default(),
//!     );
//!     let app = create_router(image_router, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod asset;
pub mod config;
pub mod delivery;
pub mod error;
pub mod iiif;
pub mod routing;
pub mod server;

// Re-export commonly used types
pub use asset::{
    AssetAccessResult, AssetAccessValidator, AssetId, AssetTracker, AuthMechanism,
    CustomHeaderRule, CustomHeaderStore, CustomerPathElement, CustomerPathResolver,
    DeliveryChannels, OrchestrationAsset, OrchestrationStatus, RequestCredentials,
    StaticMetadataStore,
};
pub use config::{CheckConfig, Cli, Command, ServeConfig, SignConfig, SignOutputFormat};
pub use delivery::{AssetDeliveryPathParser, ImageAssetDeliveryRequest};
pub use error::{AccessError, ConfigError, DeliveryError, LookupError, PathError};
pub use iiif::{
    Dimensions, ImageApiVersion, ImageRequest, Quality, Region, Rotation, SizeKind, SizeParameter,
};
pub use routing::{
    AccessDecision, AccessGate, ImageRequestRouter, ImageServerConfig, ImageServerPathConfig,
    ImageServerPathResolver, ImageServerType, ProxyAction, ProxyDestination, RoutingOutcome,
    RoutingSettings, TerminalStatus,
};
pub use server::{
    create_router, health_handler, iiif_image_handler, AccessTokenSigner, AppState, AuthError,
    CookieAccessValidator, ErrorResponse, HealthResponse, ProxyActionResponse, RouterConfig,
};
