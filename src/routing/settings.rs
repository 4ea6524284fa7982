//! Immutable routing settings injected into the router.

use crate::iiif::ImageApiVersion;

use super::image_server::{ImageServerPathConfig, ImageServerPathResolver, ImageServerType};

/// Default path prefix for the thumbnail store.
pub const DEFAULT_THUMBS_PATH: &str = "thumbs";

/// Everything the router needs to build downstream paths.
#[derive(Debug, Clone)]
pub struct RoutingSettings {
    /// Backend serving tile (non-full region) requests
    pub image_server: ImageServerType,

    /// Backend whose templates address the whole-image pool
    pub special_server: ImageServerType,

    /// Version assumed for unversioned requests
    pub default_version: ImageApiVersion,

    /// Prefix for thumbnail paths
    pub thumbs_path: String,

    pub resolver: ImageServerPathResolver,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            image_server: ImageServerType::Cantaloupe,
            special_server: ImageServerType::Cantaloupe,
            default_version: ImageApiVersion::V3,
            thumbs_path: DEFAULT_THUMBS_PATH.to_string(),
            resolver: ImageServerPathResolver::new(ImageServerPathConfig::default()),
        }
    }
}

impl RoutingSettings {
    pub fn new(config: ImageServerPathConfig) -> Self {
        Self {
            resolver: ImageServerPathResolver::new(config),
            ..Default::default()
        }
    }

    pub fn with_image_server(mut self, server: ImageServerType) -> Self {
        self.image_server = server;
        self
    }

    pub fn with_special_server(mut self, server: ImageServerType) -> Self {
        self.special_server = server;
        self
    }

    pub fn with_default_version(mut self, version: ImageApiVersion) -> Self {
        self.default_version = version;
        self
    }

    pub fn with_thumbs_path(mut self, path: impl Into<String>) -> Self {
        self.thumbs_path = path.into().trim_matches('/').to_string();
        self
    }

    /// Check that both selected backends are configured.
    pub fn validate(&self) -> Result<(), String> {
        for server in [self.image_server, self.special_server] {
            if self.resolver.config().server(server).is_none() {
                return Err(format!("image server {} is selected but not configured", server));
            }
        }
        if self.thumbs_path.is_empty() {
            return Err("thumbs path cannot be empty".to_string());
        }
        Ok(())
    }
}
