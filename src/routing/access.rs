//! Access gate for restricted assets.
//!
//! ```text
//! requires_auth?
//!   no  -> Unrestricted
//!   yes -> region full, max_unauthorised > 0 and
//!          longest output edge <= max_unauthorised?
//!          (capped at native size unless the version allows upscaling)
//!            yes -> Shortcut (no validator call)
//!            no  -> NeedsValidator -> Open | Authorized | Unauthorized
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::asset::{
    AssetAccessResult, AssetAccessValidator, AuthMechanism, OrchestrationAsset, RequestCredentials,
};
use crate::error::AccessError;
use crate::iiif::{ImageApiVersion, ImageRequest};

/// How a request relates to the asset's access policy, before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessClass {
    /// Asset does not require auth
    Unrestricted,
    /// Requested output fits within the unauthorised bound
    Shortcut,
    /// A full access check is required
    NeedsValidator,
}

/// Classify a request against an asset without calling the validator.
///
/// Only full-region requests can shortcut. `max` and `full` sizes resolve to
/// the native dimensions, so they shortcut only when those are known and
/// already within the bound. A `max_unauthorised` of zero or below never
/// shortcuts.
///
/// `version` decides whether sizes without `^` can exceed the native
/// dimensions; under Image API 3 they are capped at the source.
pub fn classify_access(
    request: &ImageRequest,
    asset: &OrchestrationAsset,
    version: ImageApiVersion,
) -> AccessClass {
    if !asset.requires_auth {
        return AccessClass::Unrestricted;
    }
    if !request.region.is_full() || asset.max_unauthorised <= 0 {
        return AccessClass::NeedsValidator;
    }

    match request.size.max_output_edge(asset.dimensions(), version) {
        Some(edge) if i64::from(edge) <= asset.max_unauthorised => AccessClass::Shortcut,
        _ => AccessClass::NeedsValidator,
    }
}

/// Outcome of the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Permitted,
    Denied,
}

/// Runs [`classify_access`] and, when needed, the access validator.
#[derive(Clone)]
pub struct AccessGate {
    validator: Arc<dyn AssetAccessValidator>,
}

impl AccessGate {
    pub fn new(validator: Arc<dyn AssetAccessValidator>) -> Self {
        Self { validator }
    }

    pub async fn check(
        &self,
        request: &ImageRequest,
        version: ImageApiVersion,
        asset: &OrchestrationAsset,
        credentials: &RequestCredentials,
        cancel: &CancellationToken,
    ) -> Result<AccessDecision, AccessError> {
        match classify_access(request, asset, version) {
            AccessClass::Unrestricted => Ok(AccessDecision::Permitted),
            AccessClass::Shortcut => {
                debug!(
                    asset = %asset.asset_id,
                    max_unauthorised = asset.max_unauthorised,
                    "Restricted asset viewable at requested size without auth"
                );
                Ok(AccessDecision::Permitted)
            }
            AccessClass::NeedsValidator => {
                let result = self
                    .validator
                    .validate(
                        &asset.asset_id,
                        &asset.roles,
                        AuthMechanism::Cookie,
                        credentials,
                        cancel,
                    )
                    .await?;
                debug!(asset = %asset.asset_id, result = ?result, "Access validated");
                Ok(match result {
                    AssetAccessResult::Open | AssetAccessResult::Authorized => AccessDecision::Permitted,
                    AssetAccessResult::Unauthorized => AccessDecision::Denied,
                })
            }
        }
    }
}
