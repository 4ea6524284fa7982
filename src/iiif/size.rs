//! Size parameter and output-size arithmetic.

use serde::{Deserialize, Serialize};

use super::ImageApiVersion;
use crate::error::PathError;

/// Pixel dimensions of an image or rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from a `[w, h]` pair as stored in open thumbnail lists.
    pub fn from_pair(pair: [u32; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    /// Longest edge.
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }

    fn scaled(&self, factor: f64) -> Dimensions {
        Dimensions {
            width: scale_edge(self.width, factor),
            height: scale_edge(self.height, factor),
        }
    }
}

fn scale_edge(edge: u32, factor: f64) -> u32 {
    ((edge as f64) * factor).round().max(1.0) as u32
}

/// The shape of a size request, without the upscale marker.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeKind {
    /// `max`
    Max,
    /// `full` (Image API 2 spelling of max)
    Full,
    /// `w,`
    Width(u32),
    /// `,h`
    Height(u32),
    /// `w,h`
    Exact { width: u32, height: u32 },
    /// `!w,h`
    Confined { width: u32, height: u32 },
    /// `pct:n`
    Percent(f64),
}

/// Parsed size parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeParameter {
    /// `^` prefix was present
    pub upscaled: bool,
    pub kind: SizeKind,
}

impl SizeParameter {
    /// Parse a size token.
    pub fn parse(token: &str) -> Result<Self, PathError> {
        let (upscaled, body) = match token.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let kind = match body {
            "max" => SizeKind::Max,
            "full" => SizeKind::Full,
            _ => {
                if let Some(pct) = body.strip_prefix("pct:") {
                    let value = pct
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite() && *n > 0.0)
                        .ok_or_else(|| PathError::invalid("size", token, "expected a positive percentage"))?;
                    SizeKind::Percent(value)
                } else {
                    let (confined, dims) = match body.strip_prefix('!') {
                        Some(rest) => (true, rest),
                        None => (false, body),
                    };
                    parse_dimensions(token, confined, dims)?
                }
            }
        };

        Ok(Self { upscaled, kind })
    }

    /// `max` or `full`.
    pub fn is_max(&self) -> bool {
        matches!(self.kind, SizeKind::Max | SizeKind::Full)
    }

    /// Output dimensions this size produces for a source of the given size.
    ///
    /// Returns `None` when the output depends on source dimensions that are
    /// not known.
    pub fn resulting_size(&self, source: Option<Dimensions>) -> Option<Dimensions> {
        let source = source.filter(|s| s.width > 0 && s.height > 0);
        match self.kind {
            SizeKind::Max | SizeKind::Full => source,
            SizeKind::Exact { width, height } => Some(Dimensions::new(width, height)),
            SizeKind::Width(width) => source.map(|s| {
                Dimensions::new(width, scale_edge(s.height, width as f64 / s.width as f64))
            }),
            SizeKind::Height(height) => source.map(|s| {
                Dimensions::new(scale_edge(s.width, height as f64 / s.height as f64), height)
            }),
            SizeKind::Confined { width, height } => source.map(|s| {
                let factor = (width as f64 / s.width as f64).min(height as f64 / s.height as f64);
                s.scaled(factor)
            }),
            SizeKind::Percent(pct) => source.map(|s| s.scaled(pct / 100.0)),
        }
    }

    /// True if the output may exceed the source under `version`.
    ///
    /// Image API 3 only scales up when the size carries `^`. Earlier
    /// versions scale up whenever the requested dimensions are larger.
    pub fn allows_upscale(&self, version: ImageApiVersion) -> bool {
        self.upscaled || version < ImageApiVersion::V3
    }

    /// Like [`resulting_size`](Self::resulting_size), but each edge is
    /// capped at the source when `version` forbids upscaling.
    pub fn output_size(&self, source: Option<Dimensions>, version: ImageApiVersion) -> Option<Dimensions> {
        let size = self.resulting_size(source)?;
        match source.filter(|s| s.width > 0 && s.height > 0) {
            Some(s) if !self.allows_upscale(version) => Some(Dimensions::new(
                size.width.min(s.width),
                size.height.min(s.height),
            )),
            _ => Some(size),
        }
    }

    /// Longest edge of the output, when it can be bounded.
    ///
    /// Unlike [`output_size`](Self::output_size) a confined request
    /// is bounded by its box even without source dimensions, and a
    /// single-dimension request without source dimensions is unbounded.
    pub fn max_output_edge(&self, source: Option<Dimensions>, version: ImageApiVersion) -> Option<u32> {
        if let Some(size) = self.output_size(source, version) {
            return Some(size.max_dimension());
        }
        match self.kind {
            SizeKind::Confined { width, height } => Some(width.max(height)),
            _ => None,
        }
    }
}

fn parse_dimensions(token: &str, confined: bool, dims: &str) -> Result<SizeKind, PathError> {
    let (w, h) = dims
        .split_once(',')
        .ok_or_else(|| PathError::invalid("size", token, "expected 'w,h', 'w,', ',h', 'max' or 'pct:n'"))?;

    let parse = |v: &str| -> Result<Option<u32>, PathError> {
        if v.is_empty() {
            return Ok(None);
        }
        match v.parse::<u32>() {
            Ok(0) | Err(_) => Err(PathError::invalid("size", token, "dimensions must be positive integers")),
            Ok(n) => Ok(Some(n)),
        }
    };

    match (parse(w)?, parse(h)?, confined) {
        (Some(width), Some(height), true) => Ok(SizeKind::Confined { width, height }),
        (Some(width), Some(height), false) => Ok(SizeKind::Exact { width, height }),
        (_, _, true) => Err(PathError::invalid("size", token, "confined size requires both dimensions")),
        (Some(width), None, false) => Ok(SizeKind::Width(width)),
        (None, Some(height), false) => Ok(SizeKind::Height(height)),
        (None, None, false) => Err(PathError::invalid("size", token, "at least one dimension is required")),
    }
}
