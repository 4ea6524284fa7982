//! Destination selection and downstream path construction.
//!
//! Decision order, once the asset is known to be an image and access is
//! permitted:
//!
//! 1. No stored source and not reingestable: NotFound
//! 2. Full region matching an open thumb exactly: Thumbs
//! 3. Full region, no stored source (reingest): ImageServer
//! 4. Full region: SpecialServer
//! 5. Anything else: ImageServer
//!
//! Region, size, rotation and quality tokens are forwarded untouched.

use tracing::debug;

use crate::asset::{OrchestrationAsset, OrchestrationStatus};
use crate::delivery::ImageAssetDeliveryRequest;
use crate::error::DeliveryError;
use crate::iiif::ImageApiVersion;

use super::image_server::{ImageServerConfig, ImageServerType, VersionResolution};
use super::outcome::{ProxyAction, ProxyDestination, RoutingOutcome, TerminalStatus};
use super::settings::RoutingSettings;

/// Pick a destination and build its path. Headers are left empty.
pub fn resolve_destination(
    request: &ImageAssetDeliveryRequest,
    asset: &OrchestrationAsset,
    settings: &RoutingSettings,
) -> Result<RoutingOutcome, DeliveryError> {
    let has_source = !asset.storage_location.is_empty();
    if !has_source && !asset.reingest {
        debug!(asset = %asset.asset_id, "Asset has no stored source and cannot be reingested");
        return Ok(RoutingOutcome::status(TerminalStatus::NotFound));
    }

    let image_request = &request.image_request;
    if !image_request.region.is_full() {
        return image_server_outcome(request, asset, settings);
    }

    if let Some(thumb) = image_request.matching_thumb(&asset.open_thumbs, asset.dimensions()) {
        debug!(asset = %asset.asset_id, width = thumb.width, height = thumb.height, "Request matches open thumb");
        let path = format!(
            "{}/{}/{}/{}/full/{}/0/default.jpg",
            settings.thumbs_path,
            asset.asset_id.customer,
            asset.asset_id.space,
            asset.asset_id.name,
            image_request.size_token()
        );
        return Ok(RoutingOutcome::Proxy(ProxyAction::new(
            ProxyDestination::Thumbs,
            path,
            asset.requires_auth,
        )));
    }

    if !has_source {
        return image_server_outcome(request, asset, settings);
    }
    special_server_outcome(request, asset, settings)
}

fn requested_version(request: &ImageAssetDeliveryRequest, settings: &RoutingSettings) -> ImageApiVersion {
    request.version.unwrap_or(settings.default_version)
}

/// Resolve a backend for the request's version, or the terminal outcome if
/// it cannot serve that version.
fn resolve_server<'a>(
    server: ImageServerType,
    request: &ImageAssetDeliveryRequest,
    settings: &'a RoutingSettings,
) -> Result<Result<(&'a ImageServerConfig, &'a str), RoutingOutcome>, DeliveryError> {
    let version = requested_version(request, settings);
    match settings.resolver.resolve(server, version) {
        VersionResolution::Resolved {
            config,
            version_template,
        } => Ok(Ok((config, version_template))),
        VersionResolution::UnsupportedVersion => {
            debug!(server = %server, version = %version, "No matching image server for requested version");
            Ok(Err(RoutingOutcome::status(TerminalStatus::BadRequest)))
        }
        VersionResolution::UnknownServer => Err(DeliveryError::Misconfigured(format!(
            "image server {} has no path configuration",
            server
        ))),
    }
}

fn image_server_outcome(
    request: &ImageAssetDeliveryRequest,
    asset: &OrchestrationAsset,
    settings: &RoutingSettings,
) -> Result<RoutingOutcome, DeliveryError> {
    let (config, version_template) = match resolve_server(settings.image_server, request, settings)? {
        Ok(resolved) => resolved,
        Err(outcome) => return Ok(outcome),
    };

    let path = format!(
        "{}{}{}",
        version_template,
        config.expand_path_template(&asset.asset_id),
        request.image_request.image_request_path()
    );
    Ok(RoutingOutcome::Proxy(ProxyAction::new(
        ProxyDestination::ImageServer,
        path,
        asset.requires_auth,
    )))
}

fn special_server_outcome(
    request: &ImageAssetDeliveryRequest,
    asset: &OrchestrationAsset,
    settings: &RoutingSettings,
) -> Result<RoutingOutcome, DeliveryError> {
    let (config, version_template) = match resolve_server(settings.special_server, request, settings)? {
        Ok(resolved) => resolved,
        Err(outcome) => return Ok(outcome),
    };

    let locator = match asset.orchestration_status {
        OrchestrationStatus::Orchestrated => config.expand_path_template(&asset.asset_id),
        _ => asset.storage_location.replace('/', &config.separator),
    };
    let path = format!(
        "{}{}{}",
        version_template,
        locator,
        request.image_request.image_request_path()
    );
    Ok(RoutingOutcome::Proxy(ProxyAction::new(
        ProxyDestination::SpecialServer,
        path,
        asset.requires_auth,
    )))
}
