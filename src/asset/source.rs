//! Read contracts of the collaborators the router consumes.
//!
//! Each collaborator owns its own storage and concurrency; the router only
//! reads through these traits and holds them as `Arc<dyn ...>`.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::{
    AssetAccessResult, AssetId, AuthMechanism, CustomHeaderRule, CustomerPathElement,
    OrchestrationAsset, RequestCredentials,
};
use crate::error::{AccessError, LookupError, PathError};

/// Resolves the customer segment of a delivery path.
#[async_trait]
pub trait CustomerPathResolver: Send + Sync {
    /// Resolve a customer name or decimal id.
    ///
    /// Returns [`PathError::UnknownCustomer`] if no customer matches.
    async fn resolve_customer(&self, segment: &str) -> Result<CustomerPathElement, PathError>;
}

/// Source of per-asset delivery metadata.
#[async_trait]
pub trait AssetTracker: Send + Sync {
    /// Fetch the asset, or `None` if it is not known.
    async fn get_orchestration_asset(
        &self,
        asset_id: &AssetId,
    ) -> Result<Option<OrchestrationAsset>, LookupError>;
}

/// Source of custom response header rules.
#[async_trait]
pub trait CustomHeaderStore: Send + Sync {
    /// All rules configured for a customer, in configured order.
    async fn get_custom_headers(&self, customer: u32) -> Result<Vec<CustomHeaderRule>, LookupError>;
}

/// Full access check for restricted assets.
#[async_trait]
pub trait AssetAccessValidator: Send + Sync {
    /// Check whether the caller may see the asset.
    ///
    /// Implementations must return [`AccessError::Cancelled`] promptly once
    /// `cancel` fires, without side effects.
    async fn validate(
        &self,
        asset_id: &AssetId,
        roles: &[String],
        mechanism: AuthMechanism,
        credentials: &RequestCredentials,
        cancel: &CancellationToken,
    ) -> Result<AssetAccessResult, AccessError>;
}
