//! The `{region}/{size}/{rotation}/{quality}.{format}` trailer.

use std::fmt;
use std::str::FromStr;

use super::region::Region;
use super::size::{Dimensions, SizeKind, SizeParameter};
use crate::error::PathError;

/// Rotation parameter, `[!]degrees`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// `!` prefix: mirror before rotating
    pub mirrored: bool,
    pub degrees: f64,
}

impl Rotation {
    pub fn parse(token: &str) -> Result<Self, PathError> {
        let (mirrored, body) = match token.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let degrees = body
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && (0.0..=360.0).contains(d))
            .ok_or_else(|| PathError::invalid("rotation", token, "expected degrees between 0 and 360"))?;
        Ok(Self { mirrored, degrees })
    }

    /// Unrotated and unmirrored.
    pub fn is_identity(&self) -> bool {
        !self.mirrored && self.degrees == 0.0
    }
}

/// Quality parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Default,
    Color,
    Gray,
    Bitonal,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Default => "default",
            Quality::Color => "color",
            Quality::Gray => "gray",
            Quality::Bitonal => "bitonal",
        }
    }
}

impl FromStr for Quality {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Quality::Default),
            "color" => Ok(Quality::Color),
            "gray" => Ok(Quality::Gray),
            "bitonal" => Ok(Quality::Bitonal),
            other => Err(PathError::invalid(
                "quality",
                other,
                "expected default, color, gray or bitonal",
            )),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed Image API request trailer.
///
/// The raw tokens are retained alongside the typed values; backends receive
/// exactly what the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub region: Region,
    pub size: SizeParameter,
    pub rotation: Rotation,
    pub quality: Quality,
    pub format: String,

    region_token: String,
    size_token: String,
    rotation_token: String,
}

impl ImageRequest {
    /// Parse the four trailing path segments.
    pub fn parse(
        region: &str,
        size: &str,
        rotation: &str,
        quality_format: &str,
    ) -> Result<Self, PathError> {
        let (quality, format) = quality_format.rsplit_once('.').ok_or_else(|| {
            PathError::invalid("quality", quality_format, "expected '{quality}.{format}'")
        })?;
        if format.is_empty() {
            return Err(PathError::invalid("format", quality_format, "format is empty"));
        }

        Ok(Self {
            region: Region::parse(region)?,
            size: SizeParameter::parse(size)?,
            rotation: Rotation::parse(rotation)?,
            quality: quality.parse()?,
            format: format.to_string(),
            region_token: region.to_string(),
            size_token: size.to_string(),
            rotation_token: rotation.to_string(),
        })
    }

    /// Size token as sent by the client.
    pub fn size_token(&self) -> &str {
        &self.size_token
    }

    /// `/{region}/{size}/{rotation}/{quality}.{format}` using the original tokens.
    pub fn image_request_path(&self) -> String {
        format!(
            "/{}/{}/{}/{}.{}",
            self.region_token, self.size_token, self.rotation_token, self.quality, self.format
        )
    }

    /// Whether a pre-rendered thumbnail could satisfy this request at all.
    ///
    /// Thumbnails are stored as unrotated default-quality jpgs of the full
    /// region, so anything else has to go to an image server.
    pub fn is_thumb_candidate(&self) -> bool {
        self.region.is_full()
            && self.rotation.is_identity()
            && matches!(self.quality, Quality::Default | Quality::Color)
            && self.format == "jpg"
            && !self.size.is_max()
            && !self.size.upscaled
    }

    /// First open thumbnail the requested size resolves to exactly.
    pub fn matching_thumb(
        &self,
        open_thumbs: &[[u32; 2]],
        source: Option<Dimensions>,
    ) -> Option<Dimensions> {
        if !self.is_thumb_candidate() {
            return None;
        }
        open_thumbs
            .iter()
            .map(|pair| Dimensions::from_pair(*pair))
            .find(|thumb| self.size_matches_thumb(*thumb, source))
    }

    fn size_matches_thumb(&self, thumb: Dimensions, source: Option<Dimensions>) -> bool {
        match self.size.kind {
            SizeKind::Exact { width, height } => width == thumb.width && height == thumb.height,
            SizeKind::Width(width) => width == thumb.width,
            SizeKind::Height(height) => height == thumb.height,
            SizeKind::Confined { width, height } => {
                thumb.width <= width
                    && thumb.height <= height
                    && (thumb.width == width || thumb.height == height)
            }
            SizeKind::Percent(_) => source.is_some() && self.size.resulting_size(source) == Some(thumb),
            SizeKind::Max | SizeKind::Full => false,
        }
    }
}
