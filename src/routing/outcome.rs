//! Routing decision types.

use std::collections::BTreeMap;
use std::fmt;

use http::StatusCode;
use serde::Serialize;

/// Backend a request is proxied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyDestination {
    /// Pre-rendered thumbnail store
    Thumbs,
    /// Tile-serving image server pool
    ImageServer,
    /// Whole-image transform pool
    SpecialServer,
}

impl ProxyDestination {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyDestination::Thumbs => "thumbs",
            ProxyDestination::ImageServer => "image_server",
            ProxyDestination::SpecialServer => "special_server",
        }
    }

    /// Served by an image server rather than a static store.
    pub fn is_image_server(&self) -> bool {
        matches!(self, ProxyDestination::ImageServer | ProxyDestination::SpecialServer)
    }
}

impl fmt::Display for ProxyDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision to answer the request directly with a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    NotFound,
    BadRequest,
    Unauthorized,
}

impl TerminalStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TerminalStatus::NotFound => StatusCode::NOT_FOUND,
            TerminalStatus::BadRequest => StatusCode::BAD_REQUEST,
            TerminalStatus::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

/// A decision to proxy the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyAction {
    pub destination: ProxyDestination,

    /// Downstream path, without a leading slash
    pub path: String,

    /// Headers to merge into the proxied response, keyed by lowercase name
    pub headers: BTreeMap<String, String>,

    #[serde(skip)]
    pub requires_auth: bool,
}

impl ProxyAction {
    pub fn new(destination: ProxyDestination, path: impl Into<String>, requires_auth: bool) -> Self {
        Self {
            destination,
            path: path.into(),
            headers: BTreeMap::new(),
            requires_auth,
        }
    }

    /// Set a header, replacing any existing value regardless of case.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// Internal location the forwarding tier redirects to.
    ///
    /// Thumbs paths already start with the thumbs location, so only
    /// image-server paths are prefixed with the destination name.
    pub fn redirect_location(&self) -> String {
        if self.destination.is_image_server() {
            format!("/{}/{}", self.destination, self.path)
        } else {
            format!("/{}", self.path)
        }
    }
}

/// Result of routing one request: exactly one of a status or a proxy action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingOutcome {
    Status(TerminalStatus),
    Proxy(ProxyAction),
}

impl RoutingOutcome {
    pub fn status(status: TerminalStatus) -> Self {
        RoutingOutcome::Status(status)
    }

    pub fn as_proxy(&self) -> Option<&ProxyAction> {
        match self {
            RoutingOutcome::Proxy(action) => Some(action),
            RoutingOutcome::Status(_) => None,
        }
    }

    pub fn as_status(&self) -> Option<TerminalStatus> {
        match self {
            RoutingOutcome::Status(status) => Some(*status),
            RoutingOutcome::Proxy(_) => None,
        }
    }
}
