//! IIIF Image API versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A IIIF Image API version that may appear as a `v{n}` path segment.
///
/// V1 is recognised so that a `/v1/` request reaches the image-server
/// resolver and is rejected there, rather than being mistaken for a customer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageApiVersion {
    V1,
    V2,
    V3,
}

impl ImageApiVersion {
    /// Path segment for this version, e.g. `v3`.
    pub fn as_segment(&self) -> &'static str {
        match self {
            ImageApiVersion::V1 => "v1",
            ImageApiVersion::V2 => "v2",
            ImageApiVersion::V3 => "v3",
        }
    }

    /// Whether a path segment has the shape of a version marker (`v` + digits).
    ///
    /// Shape is checked separately from [`FromStr`] so that `v9` is reported
    /// as an unknown version instead of being treated as a customer name.
    pub fn looks_like_version(segment: &str) -> bool {
        segment
            .strip_prefix('v')
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for ImageApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_segment())
    }
}

impl FromStr for ImageApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(ImageApiVersion::V1),
            "v2" => Ok(ImageApiVersion::V2),
            "v3" => Ok(ImageApiVersion::V3),
            other => Err(format!("unknown IIIF Image API version '{}'", other)),
        }
    }
}
