use thiserror::Error;

/// Errors raised while parsing an inbound delivery path.
///
/// Every variant maps to a terminal status: an unknown customer is a 404,
/// everything else is a 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Customer path segment did not resolve to a known customer
    #[error("Could not find customer from path segment '{0}'")]
    UnknownCustomer(String),

    /// Path does not have the expected number or shape of segments
    #[error("Malformed delivery path: {0}")]
    Malformed(String),

    /// A single segment failed to parse
    #[error("Invalid {segment} segment '{value}': {reason}")]
    InvalidSegment {
        segment: &'static str,
        value: String,
        reason: String,
    },

    /// Customer lookup failed for a reason other than "not found"
    #[error("Customer lookup failed: {0}")]
    Lookup(String),
}

impl PathError {
    /// Shorthand for building an [`PathError::InvalidSegment`].
    pub fn invalid(segment: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PathError::InvalidSegment {
            segment,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from the read-only metadata collaborators (asset tracker,
/// customer lookup, custom header store).
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// Backing store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store returned data that could not be interpreted
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Errors from the access validator.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The inbound request was cancelled while validation was in flight
    #[error("Access validation cancelled")]
    Cancelled,

    /// Validator could not reach its backing service
    #[error("Access validator unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator failures surfaced from a routing run.
///
/// These are not routing outcomes: a 400/401/404 decision is returned as a
/// value, while these represent the router being unable to decide at all.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Asset metadata lookup failed
    #[error("Asset metadata lookup failed: {0}")]
    Tracker(#[source] LookupError),

    /// Custom header lookup failed
    #[error("Custom header lookup failed: {0}")]
    Headers(#[source] LookupError),

    /// Access validator failed or was cancelled
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Routing settings reference a backend that is not configured
    #[error("Router misconfigured: {0}")]
    Misconfigured(String),
}

/// Errors loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON for the expected shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// File parsed but failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
