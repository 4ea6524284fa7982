//! Region parameter.

use crate::error::PathError;

/// Requested region of the source image.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// `full` - the whole image
    Full,

    /// `square` - largest centred square
    Square,

    /// `x,y,w,h` in source pixels
    Tile { x: u32, y: u32, w: u32, h: u32 },

    /// `pct:x,y,w,h` as percentages of the source
    Percent { x: f64, y: f64, w: f64, h: f64 },
}

impl Region {
    /// Parse a region token.
    pub fn parse(token: &str) -> Result<Self, PathError> {
        match token {
            "full" => return Ok(Region::Full),
            "square" => return Ok(Region::Square),
            _ => {}
        }

        if let Some(rest) = token.strip_prefix("pct:") {
            let [x, y, w, h] = split_four(token, rest)?;
            let parse = |v: &str| {
                v.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .ok_or_else(|| PathError::invalid("region", token, "expected non-negative percentages"))
            };
            let (x, y, w, h) = (parse(x)?, parse(y)?, parse(w)?, parse(h)?);
            if w <= 0.0 || h <= 0.0 {
                return Err(PathError::invalid("region", token, "width and height must be positive"));
            }
            return Ok(Region::Percent { x, y, w, h });
        }

        let [x, y, w, h] = split_four(token, token)?;
        let parse = |v: &str| {
            v.parse::<u32>()
                .map_err(|_| PathError::invalid("region", token, "expected integer pixel values"))
        };
        let (x, y, w, h) = (parse(x)?, parse(y)?, parse(w)?, parse(h)?);
        if w == 0 || h == 0 {
            return Err(PathError::invalid("region", token, "width and height must be positive"));
        }
        Ok(Region::Tile { x, y, w, h })
    }

    /// Whether this is the `full` region.
    pub fn is_full(&self) -> bool {
        matches!(self, Region::Full)
    }
}

fn split_four<'a>(token: &str, values: &'a str) -> Result<[&'a str; 4], PathError> {
    let parts: Vec<&str> = values.split(',').collect();
    <[&str; 4]>::try_from(parts)
        .map_err(|_| PathError::invalid("region", token, "expected four comma-separated values"))
}
