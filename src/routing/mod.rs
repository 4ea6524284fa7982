//! Delivery-time routing of IIIF image requests.
//!
//! For each request the router decides whether the caller may see the
//! requested rendition and which backend should produce it:
//!
//! - **Thumbs**: pre-rendered thumbnail store, for exact open-thumb sizes
//! - **SpecialServer**: whole-image transforms of the full region
//! - **ImageServer**: tile requests, and full requests needing reingest
//!
//! The decision logic ([`classify_access`], [`resolve_destination`],
//! [`merge_custom_headers`]) is pure; [`ImageRequestRouter`] wires it to the
//! collaborators.

mod access;
mod destination;
mod handler;
mod headers;
mod image_server;
mod outcome;
mod settings;

pub use access::{classify_access, AccessClass, AccessDecision, AccessGate};
pub use destination::resolve_destination;
pub use handler::ImageRequestRouter;
pub use headers::{
    apply_headers, merge_custom_headers, CACHE_CONTROL, PRIVATE_CACHE_CONTROL, PUBLIC_CACHE_CONTROL,
};
pub use image_server::{
    expand_path_template, ImageServerConfig, ImageServerPathConfig, ImageServerPathResolver,
    ImageServerType, VersionResolution,
};
pub use outcome::{ProxyAction, ProxyDestination, RoutingOutcome, TerminalStatus};
pub use settings::{RoutingSettings, DEFAULT_THUMBS_PATH};
