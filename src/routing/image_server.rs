//! Image server backends and their path templates.
//!
//! Each backend type has a `Separator`, a base `PathTemplate` locating an
//! asset's source on the server, and one version template per Image API
//! version it can serve:
//!
//! ```text
//! version template      path template (expanded)            image request
//! cantaloupe/iiif/3/    2%2F5%2Fte%2Fst%2Fim%2Fag%2Ftestimage   /0,0,512,512/512,/0/default.jpg
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::error::ConfigError;
use crate::iiif::ImageApiVersion;

/// Image server implementations the router knows how to address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ImageServerType {
    Cantaloupe,
    IipImage,
}

impl fmt::Display for ImageServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageServerType::Cantaloupe => f.write_str("cantaloupe"),
            ImageServerType::IipImage => f.write_str("iip-image"),
        }
    }
}

/// Path configuration for one backend type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageServerConfig {
    /// Replaces `/` between `{image-dir}` folders, e.g. `%2F` or `/`
    pub separator: String,

    /// Template locating a source image on the server
    pub path_template: String,

    /// Version segment template per supported Image API version
    pub version_path_templates: HashMap<ImageApiVersion, String>,
}

impl ImageServerConfig {
    pub fn new(separator: &str, path_template: &str) -> Self {
        Self {
            separator: separator.to_string(),
            path_template: path_template.to_string(),
            version_path_templates: HashMap::new(),
        }
    }

    pub fn with_version(mut self, version: ImageApiVersion, template: &str) -> Self {
        self.version_path_templates.insert(version, template.to_string());
        self
    }

    /// Expand the path template for an asset.
    pub fn expand_path_template(&self, asset_id: &AssetId) -> String {
        expand_path_template(&self.path_template, asset_id, &self.separator)
    }
}

/// Expand `{customer}`, `{space}`, `{image-dir}` and `{image}` in a template.
///
/// `{image-dir}` spreads the first eight characters of long names over four
/// two-character folders, followed by the full name.
pub fn expand_path_template(template: &str, asset_id: &AssetId, separator: &str) -> String {
    template
        .replace("{customer}", &asset_id.customer.to_string())
        .replace("{space}", &asset_id.space.to_string())
        .replace("{image-dir}", &split_image_name(&asset_id.name, separator))
        .replace("{image}", &asset_id.name)
}

fn split_image_name(name: &str, separator: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= 8 {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4 * (2 + separator.len()));
    for pair in chars[..8].chunks(2) {
        out.extend(pair);
        out.push_str(separator);
    }
    out.push_str(name);
    out
}

/// Path configuration for every backend type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageServerPathConfig {
    servers: HashMap<ImageServerType, ImageServerConfig>,
}

impl Default for ImageServerPathConfig {
    /// Cantaloupe serving v2 and v3, IIPImage serving v2.
    fn default() -> Self {
        Self::empty()
            .with_server(
                ImageServerType::Cantaloupe,
                ImageServerConfig::new("%2F", "{customer}%2F{space}%2F{image-dir}")
                    .with_version(ImageApiVersion::V2, "cantaloupe/iiif/2/")
                    .with_version(ImageApiVersion::V3, "cantaloupe/iiif/3/"),
            )
            .with_server(
                ImageServerType::IipImage,
                ImageServerConfig::new("/", "/nas/{customer}/{space}/{image-dir}.jp2")
                    .with_version(ImageApiVersion::V2, "iip/iipsrv.fcgi?IIIF="),
            )
    }
}

impl ImageServerPathConfig {
    pub fn empty() -> Self {
        Self {
            servers: HashMap::new(),
        }
    }

    pub fn with_server(mut self, server: ImageServerType, config: ImageServerConfig) -> Self {
        self.servers.insert(server, config);
        self
    }

    /// Load from a JSON file keyed by backend type.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (server, config) in &self.servers {
            if config.version_path_templates.is_empty() {
                return Err(format!("image server {} has no version path templates", server));
            }
        }
        Ok(())
    }

    pub fn server(&self, server: ImageServerType) -> Option<&ImageServerConfig> {
        self.servers.get(&server)
    }

    /// Configured backends, sorted for stable output.
    pub fn servers(&self) -> Vec<(ImageServerType, &ImageServerConfig)> {
        let mut servers: Vec<_> = self.servers.iter().map(|(k, v)| (*k, v)).collect();
        servers.sort_by_key(|(k, _)| *k);
        servers
    }
}

/// Result of resolving a backend/version pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionResolution<'a> {
    /// Backend serves the version with this config and version template
    Resolved {
        config: &'a ImageServerConfig,
        version_template: &'a str,
    },
    /// Backend is configured but cannot serve the version
    UnsupportedVersion,
    /// Backend is not configured at all
    UnknownServer,
}

/// Maps (backend, version) to a version path template.
#[derive(Debug, Clone)]
pub struct ImageServerPathResolver {
    config: ImageServerPathConfig,
}

impl ImageServerPathResolver {
    pub fn new(config: ImageServerPathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImageServerPathConfig {
        &self.config
    }

    pub fn resolve(&self, server: ImageServerType, version: ImageApiVersion) -> VersionResolution<'_> {
        let Some(config) = self.config.server(server) else {
            return VersionResolution::UnknownServer;
        };
        match config.version_path_templates.get(&version) {
            Some(template) => VersionResolution::Resolved {
                config,
                version_template: template,
            },
            None => VersionResolution::UnsupportedVersion,
        }
    }
}
