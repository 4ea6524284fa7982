//! Inbound delivery path handling.
//!
//! ```text
//! /iiif-img/v3/test-customer/2/test-image/full/!150,150/0/default.jpg
//!  ^prefix  ^version? ^customer ^space ^asset ^image request trailer
//! ```
//!
//! The customer segment is resolved to an id, so everything downstream works
//! with a numeric [`AssetId`](crate::asset::AssetId).

mod path;

pub use path::{AssetDeliveryPathParser, ImageAssetDeliveryRequest};
