//! Asset model shared by the router and its collaborators.

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::iiif::Dimensions;

// =============================================================================
// AssetId
// =============================================================================

/// Identifies an asset as `{customer}/{space}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId {
    pub customer: u32,
    pub space: u32,
    pub name: String,
}

impl AssetId {
    pub fn new(customer: u32, space: u32, name: impl Into<String>) -> Self {
        Self {
            customer,
            space,
            name: name.into(),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.customer, self.space, self.name)
    }
}

impl FromStr for AssetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '/');
        let (Some(customer), Some(space), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("asset id '{}' is not customer/space/name", s));
        };
        if name.is_empty() {
            return Err(format!("asset id '{}' has an empty name", s));
        }
        let customer = customer
            .parse()
            .map_err(|_| format!("asset id '{}' has a non-numeric customer", s))?;
        let space = space
            .parse()
            .map_err(|_| format!("asset id '{}' has a non-numeric space", s))?;
        Ok(Self::new(customer, space, name))
    }
}

impl TryFrom<String> for AssetId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.to_string()
    }
}

// =============================================================================
// Delivery channels
// =============================================================================

/// Set of channels an asset can be delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DeliveryChannels(u8);

impl DeliveryChannels {
    pub const NONE: DeliveryChannels = DeliveryChannels(0);
    pub const IMAGE: DeliveryChannels = DeliveryChannels(1);
    pub const FILE: DeliveryChannels = DeliveryChannels(1 << 1);
    pub const TIMEBASED: DeliveryChannels = DeliveryChannels(1 << 2);
    pub const THUMBNAILS: DeliveryChannels = DeliveryChannels(1 << 3);

    const NAMED: [(&'static str, DeliveryChannels); 4] = [
        ("image", Self::IMAGE),
        ("file", Self::FILE),
        ("timebased", Self::TIMEBASED),
        ("thumbs", Self::THUMBNAILS),
    ];

    /// True if every channel in `other` is also in `self`.
    pub fn contains(&self, other: DeliveryChannels) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DeliveryChannels {
    type Output = DeliveryChannels;

    fn bitor(self, rhs: Self) -> Self::Output {
        DeliveryChannels(self.0 | rhs.0)
    }
}

impl TryFrom<Vec<String>> for DeliveryChannels {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(DeliveryChannels::NONE, |acc, name| {
            DeliveryChannels::NAMED
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, channel)| acc | *channel)
                .ok_or_else(|| format!("unknown delivery channel '{}'", name))
        })
    }
}

impl From<DeliveryChannels> for Vec<String> {
    fn from(channels: DeliveryChannels) -> Self {
        DeliveryChannels::NAMED
            .iter()
            .filter(|(_, channel)| channels.contains(*channel))
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

// =============================================================================
// OrchestrationAsset
// =============================================================================

/// Whether the source image has been copied to image-server local disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    #[default]
    NotOrchestrated,
    Orchestrating,
    Orchestrated,
}

fn unconstrained() -> i64 {
    -1
}

/// Delivery metadata for one asset, as held by the asset tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationAsset {
    pub asset_id: AssetId,

    #[serde(default)]
    pub channels: DeliveryChannels,

    #[serde(default)]
    pub requires_auth: bool,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Largest edge servable without auth; -1 if no size is servable
    /// without auth.
    #[serde(default = "unconstrained")]
    pub max_unauthorised: i64,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    /// Pre-rendered sizes, largest first.
    #[serde(default)]
    pub open_thumbs: Vec<[u32; 2]>,

    /// Storage URI of the source image; empty if it was never stored.
    #[serde(default)]
    pub storage_location: String,

    #[serde(default)]
    pub reingest: bool,

    #[serde(default)]
    pub orchestration_status: OrchestrationStatus,
}

impl OrchestrationAsset {
    /// Native dimensions, if both are known.
    pub fn dimensions(&self) -> Option<Dimensions> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(Dimensions::new(w, h)),
            _ => None,
        }
    }

    pub fn has_channel(&self, channel: DeliveryChannels) -> bool {
        self.channels.contains(channel)
    }

    /// Requires auth and has roles to check against.
    pub fn is_restricted(&self) -> bool {
        self.requires_auth && !self.roles.is_empty()
    }

    /// Open thumbs must not exceed the unauthorised bound of a restricted asset.
    pub fn validate(&self) -> Result<(), String> {
        if self.requires_auth && self.max_unauthorised >= 0 {
            let bound = self.max_unauthorised;
            if let Some(thumb) = self
                .open_thumbs
                .iter()
                .find(|t| i64::from(t[0].max(t[1])) > bound)
            {
                return Err(format!(
                    "asset {} has open thumb {}x{} larger than max_unauthorised {}",
                    self.asset_id, thumb[0], thumb[1], bound
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Customers and headers
// =============================================================================

/// A resolved customer path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPathElement {
    pub id: u32,
    pub name: String,
}

/// A custom response header scoped by optional space and role.
///
/// A `role` of `Some("")` is an explicit role wildcard and ranks like `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHeaderRule {
    #[serde(default)]
    pub space: Option<u32>,
    #[serde(default)]
    pub role: Option<String>,
    pub key: String,
    pub value: String,
}

impl CustomHeaderRule {
    pub fn new(space: Option<u32>, role: Option<&str>, key: &str, value: &str) -> Self {
        Self {
            space,
            role: role.map(str::to_string),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Role is set and non-empty.
    pub fn has_role(&self) -> bool {
        self.role.as_deref().is_some_and(|r| !r.is_empty())
    }
}

// =============================================================================
// Access validation
// =============================================================================

/// How the caller presented their credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMechanism {
    Cookie,
}

/// Result of a full access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetAccessResult {
    /// Asset has no access restrictions
    Open,
    /// Caller holds a matching role
    Authorized,
    /// Caller may not see the asset
    Unauthorized,
}

/// Credentials carried by the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    cookies: HashMap<String, String>,
}

impl RequestCredentials {
    /// Collect cookies from `Cookie` header values (`a=1; b=2`).
    pub fn from_cookie_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let cookies = headers
            .into_iter()
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();
        Self { cookies }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}
