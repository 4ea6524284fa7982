//! Configuration management for the IIIF delivery router.
//!
//! This module provides the command-line surface:
//! - `serve` (default): run the HTTP router
//! - `sign`: mint an access-cookie value for testing restricted assets
//! - `check`: validate the configuration files without starting a server
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use iiif_delivery_router::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Sign(_) | Command::Check(_) => {}
//! }
//! ```
//!
//! # Environment Variables
//!
//! Serve options can be set via environment variables with the `IIIF_` prefix:
//!
//! - `IIIF_HOST` - Server bind address (default: 0.0.0.0)
//! - `IIIF_PORT` - Server port (default: 3000)
//! - `IIIF_METADATA_FILE` - JSON snapshot of customers, assets and header rules
//! - `IIIF_IMAGE_SERVER_CONFIG` - JSON map of backend path templates
//! - `IIIF_IMAGE_SERVER` - Tile backend (default: cantaloupe)
//! - `IIIF_SPECIAL_SERVER` - Whole-image backend (default: cantaloupe)
//! - `IIIF_DEFAULT_IMAGE_VERSION` - Version for unversioned paths (default: v3)
//! - `IIIF_THUMBS_PATH` - Thumbnail store prefix (default: thumbs)
//! - `IIIF_AUTH_SECRET` - HMAC secret for access cookies (required)
//! - `IIIF_COOKIE_NAME_FORMAT` - Access cookie name (default: dlcs-token-{customer})
//! - `IIIF_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::asset::StaticMetadataStore;
use crate::error::ConfigError;
use crate::iiif::ImageApiVersion;
use crate::routing::{ImageServerPathConfig, ImageServerType, RoutingSettings, DEFAULT_THUMBS_PATH};
use crate::server::auth::{AccessTokenSigner, CookieAccessValidator, DEFAULT_COOKIE_NAME_FORMAT};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default lifetime of a signed access cookie (1 hour).
pub const DEFAULT_SIGN_TTL: u64 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// IIIF delivery router - decides where each IIIF Image API request is served from.
#[derive(Parser, Debug, Clone)]
#[command(name = "iiif-delivery-router")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the default `serve` command
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The selected command, `serve` when none is given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP router (default)
    Serve(ServeConfig),

    /// Mint a signed access-cookie value
    Sign(SignConfig),

    /// Validate configuration files and print what would be served
    Check(CheckConfig),
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IIIF_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IIIF_PORT")]
    pub port: u16,

    // =========================================================================
    // Routing Configuration
    // =========================================================================
    /// JSON snapshot with customers, assets and custom header rules.
    ///
    /// If not specified, every request resolves to 404.
    #[arg(long, env = "IIIF_METADATA_FILE")]
    pub metadata_file: Option<PathBuf>,

    /// JSON map of image server backends to their path templates.
    ///
    /// If not specified, built-in Cantaloupe and IIPImage templates are used.
    #[arg(long, env = "IIIF_IMAGE_SERVER_CONFIG")]
    pub image_server_config: Option<PathBuf>,

    /// Backend serving tile requests.
    #[arg(long, value_enum, default_value_t = ImageServerType::Cantaloupe, env = "IIIF_IMAGE_SERVER")]
    pub image_server: ImageServerType,

    /// Backend whose templates address whole-image requests.
    #[arg(long, value_enum, default_value_t = ImageServerType::Cantaloupe, env = "IIIF_SPECIAL_SERVER")]
    pub special_server: ImageServerType,

    /// IIIF Image API version assumed for paths without a version segment.
    #[arg(long, value_enum, default_value_t = ImageApiVersion::V3, env = "IIIF_DEFAULT_IMAGE_VERSION")]
    pub default_image_version: ImageApiVersion,

    /// Path prefix of the thumbnail store.
    #[arg(long, default_value = DEFAULT_THUMBS_PATH, env = "IIIF_THUMBS_PATH")]
    pub thumbs_path: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for HMAC-SHA256 signed access cookies.
    #[arg(long, env = "IIIF_AUTH_SECRET")]
    pub auth_secret: Option<String>,

    /// Access cookie name; `{customer}` is replaced by the customer id.
    #[arg(long, default_value = DEFAULT_COOKIE_NAME_FORMAT, env = "IIIF_COOKIE_NAME_FORMAT")]
    pub cookie_name_format: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IIIF_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self.auth_secret.as_deref() {
            None | Some("") => {
                return Err("No access cookie secret provided. \
                     Set --auth-secret or IIIF_AUTH_SECRET"
                    .to_string());
            }
            Some(_) => {}
        }

        if !self.cookie_name_format.contains("{customer}") {
            return Err("cookie_name_format must contain {customer}".to_string());
        }

        if self.default_image_version == ImageApiVersion::V1 {
            return Err("default_image_version must be v2 or v3".to_string());
        }

        if self.thumbs_path.trim_matches('/').is_empty() {
            return Err("thumbs_path cannot be empty".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load the backend path templates, falling back to the built-in set.
    pub fn load_image_server_config(&self) -> Result<ImageServerPathConfig, ConfigError> {
        load_image_server_config(self.image_server_config.as_ref())
    }

    /// Load the metadata snapshot, or an empty store when none is configured.
    pub fn load_metadata(&self) -> Result<StaticMetadataStore, ConfigError> {
        load_metadata(self.metadata_file.as_ref())
    }

    /// Build the routing settings over the given backend templates.
    ///
    /// Fails if a selected backend is missing from `config`.
    pub fn routing_settings(&self, config: ImageServerPathConfig) -> Result<RoutingSettings, ConfigError> {
        let settings = RoutingSettings::new(config)
            .with_image_server(self.image_server)
            .with_special_server(self.special_server)
            .with_default_version(self.default_image_version)
            .with_thumbs_path(self.thumbs_path.as_str());
        settings.validate().map_err(ConfigError::Invalid)?;
        Ok(settings)
    }

    /// Build the cookie validator (call validate() first).
    pub fn access_validator(&self) -> CookieAccessValidator {
        let secret = self.auth_secret.as_deref().unwrap_or_default();
        CookieAccessValidator::new(AccessTokenSigner::new(secret))
            .with_cookie_name_format(self.cookie_name_format.as_str())
    }
}

fn load_image_server_config(path: Option<&PathBuf>) -> Result<ImageServerPathConfig, ConfigError> {
    match path {
        Some(path) => ImageServerPathConfig::from_file(path),
        None => Ok(ImageServerPathConfig::default()),
    }
}

fn load_metadata(path: Option<&PathBuf>) -> Result<StaticMetadataStore, ConfigError> {
    match path {
        Some(path) => StaticMetadataStore::from_file(path),
        None => Ok(StaticMetadataStore::new()),
    }
}

// =============================================================================
// Sign
// =============================================================================

/// Output format of the `sign` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignOutputFormat {
    /// Bare cookie value
    #[default]
    Value,
    /// `Cookie: name=value` header line
    Header,
    /// JSON object with name, value, expiry and roles
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct SignConfig {
    /// Customer id the cookie is issued for.
    #[arg(short, long)]
    pub customer: u32,

    /// Roles granted by the cookie (comma-separated).
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub roles: Vec<String>,

    /// Secret key shared with the server.
    #[arg(short, long, env = "IIIF_AUTH_SECRET")]
    pub secret: String,

    /// Cookie lifetime in seconds.
    #[arg(short, long, default_value_t = DEFAULT_SIGN_TTL)]
    pub ttl: u64,

    /// Access cookie name; `{customer}` is replaced by the customer id.
    #[arg(long, default_value = DEFAULT_COOKIE_NAME_FORMAT, env = "IIIF_COOKIE_NAME_FORMAT")]
    pub cookie_name_format: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = SignOutputFormat::Value)]
    pub format: SignOutputFormat,
}

impl SignConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("Secret cannot be empty".to_string());
        }
        if self.ttl == 0 {
            return Err("TTL must be greater than 0".to_string());
        }
        if self.roles.iter().any(|r| r.trim().is_empty()) {
            return Err("Roles cannot be empty".to_string());
        }
        if !self.cookie_name_format.contains("{customer}") {
            return Err("cookie_name_format must contain {customer}".to_string());
        }
        Ok(())
    }

    pub fn cookie_name(&self) -> String {
        self.cookie_name_format
            .replace("{customer}", &self.customer.to_string())
    }
}

// =============================================================================
// Check
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// JSON snapshot with customers, assets and custom header rules.
    #[arg(long, env = "IIIF_METADATA_FILE")]
    pub metadata_file: Option<PathBuf>,

    /// JSON map of image server backends to their path templates.
    #[arg(long, env = "IIIF_IMAGE_SERVER_CONFIG")]
    pub image_server_config: Option<PathBuf>,

    /// Backend serving tile requests.
    #[arg(long, value_enum, default_value_t = ImageServerType::Cantaloupe, env = "IIIF_IMAGE_SERVER")]
    pub image_server: ImageServerType,

    /// Backend whose templates address whole-image requests.
    #[arg(long, value_enum, default_value_t = ImageServerType::Cantaloupe, env = "IIIF_SPECIAL_SERVER")]
    pub special_server: ImageServerType,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn load_image_server_config(&self) -> Result<ImageServerPathConfig, ConfigError> {
        load_image_server_config(self.image_server_config.as_ref())
    }

    pub fn load_metadata(&self) -> Result<StaticMetadataStore, ConfigError> {
        load_metadata(self.metadata_file.as_ref())
    }
}

// =============================================================================
// Tests
// =============================================================================
