//! Delivery path parsing.

use std::sync::Arc;

use tracing::debug;

use crate::asset::{AssetId, CustomerPathElement, CustomerPathResolver};
use crate::error::PathError;
use crate::iiif::{ImageApiVersion, ImageRequest};

/// Segments after the optional version: customer, space, asset and the
/// four image request segments.
const UNVERSIONED_SEGMENTS: usize = 7;

/// A fully parsed image delivery request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAssetDeliveryRequest {
    /// First path segment, e.g. `iiif-img`
    pub route_prefix: String,

    /// Explicit version segment, if present
    pub version: Option<ImageApiVersion>,

    /// Customer the customer segment resolved to
    pub customer: CustomerPathElement,

    pub space: u32,

    pub asset_id: AssetId,

    pub image_request: ImageRequest,

    /// `/{prefix}[/{version}]/{customer id}/{space}/`
    pub normalised_base_path: String,
}

impl ImageAssetDeliveryRequest {
    /// Normalised path of the whole request, used for logging.
    pub fn normalised_full_path(&self) -> String {
        format!(
            "{}{}{}",
            self.normalised_base_path,
            self.asset_id.name,
            self.image_request.image_request_path()
        )
    }
}

/// Parses `/{prefix}/{version?}/{customer}/{space}/{asset}/{region}/{size}/{rotation}/{quality}.{format}`.
#[derive(Clone)]
pub struct AssetDeliveryPathParser {
    customers: Arc<dyn CustomerPathResolver>,
}

impl AssetDeliveryPathParser {
    pub fn new(customers: Arc<dyn CustomerPathResolver>) -> Self {
        Self { customers }
    }

    /// Parse a raw request path.
    ///
    /// The path is percent-decoded and any query string or fragment is
    /// dropped before splitting.
    pub async fn parse(&self, path: &str) -> Result<ImageAssetDeliveryRequest, PathError> {
        let decoded = urlencoding::decode(path)
            .map_err(|_| PathError::Malformed(format!("'{}' is not valid UTF-8 once decoded", path)))?;
        let trimmed = match decoded.find(['?', '#']) {
            Some(idx) => &decoded[..idx],
            None => &decoded[..],
        };

        let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();
        let Some((&route_prefix, rest)) = parts.split_first() else {
            return Err(PathError::Malformed("path is empty".to_string()));
        };

        let (version, rest) = match rest.first() {
            Some(candidate) if ImageApiVersion::looks_like_version(candidate) => {
                let version = candidate
                    .parse::<ImageApiVersion>()
                    .map_err(|reason| PathError::invalid("version", *candidate, reason))?;
                (Some(version), &rest[1..])
            }
            _ => (None, rest),
        };

        let [customer, space, asset, region, size, rotation, quality_format] =
            <[&str; UNVERSIONED_SEGMENTS]>::try_from(rest).map_err(|_| {
                PathError::Malformed(format!(
                    "expected {{customer}}/{{space}}/{{asset}}/{{region}}/{{size}}/{{rotation}}/{{quality}}.{{format}} after '{}', got {} segments",
                    route_prefix,
                    rest.len()
                ))
            })?;

        let space: u32 = space
            .parse()
            .map_err(|_| PathError::invalid("space", space, "expected an integer"))?;

        let customer = self.customers.resolve_customer(customer).await?;
        let image_request = ImageRequest::parse(region, size, rotation, quality_format)?;

        let normalised_base_path = match version {
            Some(v) => format!("/{}/{}/{}/{}/", route_prefix, v, customer.id, space),
            None => format!("/{}/{}/{}/", route_prefix, customer.id, space),
        };

        let request = ImageAssetDeliveryRequest {
            route_prefix: route_prefix.to_string(),
            version,
            asset_id: AssetId::new(customer.id, space, asset),
            customer,
            space,
            image_request,
            normalised_base_path,
        };
        debug!(path = %request.normalised_full_path(), "Parsed delivery path");
        Ok(request)
    }
}
