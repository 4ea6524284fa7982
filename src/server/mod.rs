//! HTTP server layer for the IIIF delivery router.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                  GET /iiif-img/{*path}                          │
//! │                                                                 │
//! │  ┌─────────────┐  ┌───────────────┐  ┌───────────────────────┐  │
//! │  │  handlers   │  │     auth      │  │        routes         │  │
//! │  │ (requests)  │  │ (access cookie│  │   (router config)     │  │
//! │  │             │  │  validator)   │  │                       │  │
//! │  └─────────────┘  └───────────────┘  └───────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{AccessTokenSigner, AuthError, CookieAccessValidator, DEFAULT_COOKIE_NAME_FORMAT};
pub use handlers::{
    health_handler, iiif_image_handler, AppState, ErrorResponse, HealthResponse, ProxyActionResponse,
    X_ACCEL_REDIRECT, X_PROXY_DESTINATION,
};
pub use routes::{create_router, RouterConfig, IIIF_IMAGE_PREFIX};
