//! IIIF Image API request grammar.
//!
//! Parses the trailing `{region}/{size}/{rotation}/{quality}.{format}` part of
//! an Image API request into typed parameters, keeping the original tokens so
//! they can be forwarded untouched to whichever backend serves the request.
//!
//! # Grammar
//!
//! ```text
//! region   = full | square | x,y,w,h | pct:x,y,w,h
//! size     = [^] ( max | full | w, | ,h | w,h | !w,h | pct:n )
//! rotation = [!] degrees            (0 <= degrees <= 360)
//! quality  = default | color | gray | bitonal
//! ```

mod region;
mod request;
mod size;
mod version;

pub use region::Region;
pub use request::{ImageRequest, Quality, Rotation};
pub use size::{Dimensions, SizeKind, SizeParameter};
pub use version::ImageApiVersion;
