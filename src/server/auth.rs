//! Access cookie authentication.
//!
//! Restricted assets are validated against a signed access cookie. The cookie
//! is named per customer (default `dlcs-token-{customer}`) and carries the
//! caller's roles, an expiry and an HMAC-SHA256 signature:
//!
//! ```text
//! cookie value = roles=clickthrough%2Cstaff&exp=1735689600&sig=abc123...
//! signature    = HMAC-SHA256(secret_key, "{customer}?exp={exp}&roles={csv}")
//! ```
//!
//! The signed message uses the canonical (sorted) query form, so the order of
//! pairs in the cookie does not matter.
//!
//! # Security Properties
//!
//! - **Customer binding**: a cookie minted for one customer fails for another
//! - **Time-limited**: cookies expire after a configurable TTL
//! - **Constant-time comparison**: signatures are compared in constant time
//!
//! # Example
//!
//! ```rust
//! use iiif_delivery_router::server::auth::AccessTokenSigner;
//! use std::time::Duration;
//!
//! let signer = AccessTokenSigner::new("my-secret-key");
//! let value = signer.cookie_value(2, &["staff".to_string()], Duration::from_secs(3600));
//! assert_eq!(signer.verify(2, &value).unwrap(), vec!["staff".to_string()]);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::asset::{
    AssetAccessResult, AssetAccessValidator, AssetId, AuthMechanism, RequestCredentials,
};
use crate::error::AccessError;

// =============================================================================
// Types
// =============================================================================

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Default access cookie name; `{customer}` is replaced by the customer id.
pub const DEFAULT_COOKIE_NAME_FORMAT: &str = "dlcs-token-{customer}";

/// Reasons an access cookie is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No access cookie for the customer
    MissingCookie,

    /// Signature is missing from the cookie
    MissingSignature,

    /// Expiry timestamp is missing from the cookie
    MissingExpiry,

    /// Cookie has expired
    Expired {
        /// When the cookie expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },

    /// Signature does not match
    InvalidSignature,

    /// Signature is not valid hex
    InvalidSignatureFormat,

    /// Expiry timestamp is not a valid integer
    InvalidExpiryFormat,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCookie => write!(f, "Missing access cookie"),
            AuthError::MissingSignature => write!(f, "Missing signature parameter"),
            AuthError::MissingExpiry => write!(f, "Missing expiry parameter"),
            AuthError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Access cookie expired at {} (current time: {})",
                expired_at, current_time
            ),
            AuthError::InvalidSignature => write!(f, "Invalid signature"),
            AuthError::InvalidSignatureFormat => write!(f, "Invalid signature format"),
            AuthError::InvalidExpiryFormat => write!(f, "Invalid expiry format"),
        }
    }
}

impl std::error::Error for AuthError {}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// Access Token Signing
// =============================================================================

/// Mints and verifies access cookie values.
#[derive(Clone)]
pub struct AccessTokenSigner {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl AccessTokenSigner {
    /// Create a signer with the given secret key.
    ///
    /// The key should be at least 32 bytes.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Build a cookie value valid for `ttl` from now.
    pub fn cookie_value(&self, customer: u32, roles: &[String], ttl: Duration) -> String {
        self.cookie_value_with_expiry(customer, roles, now_secs() + ttl.as_secs())
    }

    /// Build a cookie value with a specific expiry timestamp.
    pub fn cookie_value_with_expiry(&self, customer: u32, roles: &[String], expiry: u64) -> String {
        let csv = roles.join(",");
        let signature = self.compute_signature(customer, expiry, &csv);

        form_urlencoded::Serializer::new(String::new())
            .append_pair("roles", &csv)
            .append_pair("exp", &expiry.to_string())
            .append_pair("sig", &signature)
            .finish()
    }

    /// Verify a cookie value for a customer, returning the roles it grants.
    pub fn verify(&self, customer: u32, cookie_value: &str) -> Result<Vec<String>, AuthError> {
        let mut roles: Option<String> = None;
        let mut signature: Option<String> = None;
        let mut expiry: Option<u64> = None;

        for (key, value) in form_urlencoded::parse(cookie_value.as_bytes()) {
            match key.as_ref() {
                "sig" => {
                    if signature.is_some() {
                        return Err(AuthError::InvalidSignatureFormat);
                    }
                    signature = Some(value.into_owned());
                }
                "exp" => {
                    if expiry.is_some() {
                        return Err(AuthError::InvalidExpiryFormat);
                    }
                    expiry = Some(value.parse().map_err(|_| AuthError::InvalidExpiryFormat)?);
                }
                "roles" => roles = Some(value.into_owned()),
                _ => {}
            }
        }

        let signature = signature.ok_or(AuthError::MissingSignature)?;
        let expiry = expiry.ok_or(AuthError::MissingExpiry)?;
        let roles = roles.unwrap_or_default();

        let current_time = now_secs();
        if current_time > expiry {
            return Err(AuthError::Expired {
                expired_at: expiry,
                current_time,
            });
        }

        let provided_sig = hex::decode(&signature).map_err(|_| AuthError::InvalidSignatureFormat)?;
        let expected_sig = hex::decode(self.compute_signature(customer, expiry, &roles))
            .map_err(|_| AuthError::InvalidSignatureFormat)?;

        if !bool::from(provided_sig.ct_eq(&expected_sig)) {
            return Err(AuthError::InvalidSignature);
        }

        Ok(roles
            .split(',')
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Compute the hex-encoded HMAC-SHA256 signature.
    fn compute_signature(&self, customer: u32, expiry: u64, roles_csv: &str) -> String {
        let message = signature_base(customer, expiry, roles_csv);

        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn signature_base(customer: u32, expiry: u64, roles_csv: &str) -> String {
    let params = [
        ("roles".to_string(), roles_csv.to_string()),
        ("exp".to_string(), expiry.to_string()),
    ];
    format!("{}?{}", customer, canonical_query(&params))
}

fn canonical_query(params: &[(String, String)]) -> String {
    let mut pairs = params.to_vec();
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

// =============================================================================
// Cookie Access Validator
// =============================================================================

/// [`AssetAccessValidator`] backed by signed access cookies.
#[derive(Clone)]
pub struct CookieAccessValidator {
    signer: AccessTokenSigner,
    cookie_name_format: String,
}

impl CookieAccessValidator {
    pub fn new(signer: AccessTokenSigner) -> Self {
        Self {
            signer,
            cookie_name_format: DEFAULT_COOKIE_NAME_FORMAT.to_string(),
        }
    }

    pub fn with_cookie_name_format(mut self, format: impl Into<String>) -> Self {
        self.cookie_name_format = format.into();
        self
    }

    /// Access cookie name for a customer.
    pub fn cookie_name(&self, customer: u32) -> String {
        self.cookie_name_format
            .replace("{customer}", &customer.to_string())
    }

    fn check(
        &self,
        asset_id: &AssetId,
        roles: &[String],
        credentials: &RequestCredentials,
    ) -> Result<AssetAccessResult, AuthError> {
        if roles.is_empty() {
            return Ok(AssetAccessResult::Open);
        }

        let cookie = credentials
            .cookie(&self.cookie_name(asset_id.customer))
            .ok_or(AuthError::MissingCookie)?;
        let granted = self.signer.verify(asset_id.customer, cookie)?;

        if granted.iter().any(|g| roles.contains(g)) {
            Ok(AssetAccessResult::Authorized)
        } else {
            Ok(AssetAccessResult::Unauthorized)
        }
    }
}

#[async_trait]
impl AssetAccessValidator for CookieAccessValidator {
    async fn validate(
        &self,
        asset_id: &AssetId,
        roles: &[String],
        mechanism: AuthMechanism,
        credentials: &RequestCredentials,
        cancel: &CancellationToken,
    ) -> Result<AssetAccessResult, AccessError> {
        if cancel.is_cancelled() {
            return Err(AccessError::Cancelled);
        }
        let AuthMechanism::Cookie = mechanism;

        match self.check(asset_id, roles, credentials) {
            Ok(result) => Ok(result),
            Err(AuthError::InvalidSignature) => {
                // Could indicate tampering
                warn!(asset = %asset_id, "Access cookie rejected: invalid signature");
                Ok(AssetAccessResult::Unauthorized)
            }
            Err(e) => {
                debug!(asset = %asset_id, "Access cookie rejected: {}", e);
                Ok(AssetAccessResult::Unauthorized)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
