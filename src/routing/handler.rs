//! Image request routing pipeline.
//!
//! ```text
//! path ──► AssetDeliveryPathParser ──► AssetTracker ──► AccessGate
//!                                                          │
//!            RoutingOutcome ◄── apply_headers ◄── resolve_destination
//! ```
//!
//! Every failure to classify the request becomes a terminal status. Only
//! collaborator outages surface as [`DeliveryError`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::asset::{
    AssetAccessValidator, AssetTracker, CustomHeaderStore, CustomerPathResolver, DeliveryChannels,
    RequestCredentials,
};
use crate::delivery::{AssetDeliveryPathParser, ImageAssetDeliveryRequest};
use crate::error::{DeliveryError, PathError};

use super::access::{AccessDecision, AccessGate};
use super::destination::resolve_destination;
use super::headers::apply_headers;
use super::outcome::{RoutingOutcome, TerminalStatus};
use super::settings::RoutingSettings;

/// Routes IIIF image requests to a backend or a terminal status.
#[derive(Clone)]
pub struct ImageRequestRouter {
    parser: AssetDeliveryPathParser,
    tracker: Arc<dyn AssetTracker>,
    header_store: Arc<dyn CustomHeaderStore>,
    gate: AccessGate,
    settings: Arc<RoutingSettings>,
}

impl ImageRequestRouter {
    pub fn new(
        customers: Arc<dyn CustomerPathResolver>,
        tracker: Arc<dyn AssetTracker>,
        header_store: Arc<dyn CustomHeaderStore>,
        validator: Arc<dyn AssetAccessValidator>,
        settings: RoutingSettings,
    ) -> Self {
        Self {
            parser: AssetDeliveryPathParser::new(customers),
            tracker,
            header_store,
            gate: AccessGate::new(validator),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    /// Parse and route a raw request path.
    pub async fn route(
        &self,
        path: &str,
        credentials: &RequestCredentials,
        cancel: &CancellationToken,
    ) -> Result<RoutingOutcome, DeliveryError> {
        let request = match self.parser.parse(path).await {
            Ok(request) => request,
            Err(PathError::UnknownCustomer(customer)) => {
                debug!(path = %path, customer = %customer, "Could not find customer");
                return Ok(RoutingOutcome::status(TerminalStatus::NotFound));
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Error parsing path");
                return Ok(RoutingOutcome::status(TerminalStatus::BadRequest));
            }
        };

        self.route_request(&request, credentials, cancel).await
    }

    /// Route an already parsed request.
    pub async fn route_request(
        &self,
        request: &ImageAssetDeliveryRequest,
        credentials: &RequestCredentials,
        cancel: &CancellationToken,
    ) -> Result<RoutingOutcome, DeliveryError> {
        let asset = self
            .tracker
            .get_orchestration_asset(&request.asset_id)
            .await
            .map_err(DeliveryError::Tracker)?;

        let Some(asset) = asset.filter(|a| a.has_channel(DeliveryChannels::IMAGE)) else {
            debug!(asset = %request.asset_id, "Image asset not found");
            return Ok(RoutingOutcome::status(TerminalStatus::NotFound));
        };

        let version = request.version.unwrap_or(self.settings.default_version);
        let decision = self
            .gate
            .check(&request.image_request, version, &asset, credentials, cancel)
            .await?;
        if decision == AccessDecision::Denied {
            debug!(asset = %asset.asset_id, "Request unauthorised");
            return Ok(RoutingOutcome::status(TerminalStatus::Unauthorized));
        }

        let mut action = match resolve_destination(request, &asset, &self.settings)? {
            RoutingOutcome::Proxy(action) => action,
            status => return Ok(status),
        };

        let rules = self
            .header_store
            .get_custom_headers(asset.asset_id.customer)
            .await
            .map_err(DeliveryError::Headers)?;
        apply_headers(&mut action, &rules, &asset);

        debug!(
            asset = %asset.asset_id,
            destination = %action.destination,
            path = %action.path,
            "Routed image request"
        );
        Ok(RoutingOutcome::Proxy(action))
    }
}
