//! Asset delivery metadata and the collaborators that supply it.
//!
//! The router never owns asset state. It reads an [`OrchestrationAsset`]
//! snapshot per request through [`AssetTracker`], resolves customers through
//! [`CustomerPathResolver`], reads header policy through
//! [`CustomHeaderStore`] and performs full access checks through
//! [`AssetAccessValidator`].
//!
//! [`StaticMetadataStore`] implements the read-only lookups over a JSON
//! snapshot, which is what the binary serves from.

mod snapshot;
mod source;
mod types;

pub use snapshot::StaticMetadataStore;
pub use source::{AssetAccessValidator, AssetTracker, CustomHeaderStore, CustomerPathResolver};
pub use types::{
    AssetAccessResult, AssetId, AuthMechanism, CustomHeaderRule, CustomerPathElement,
    DeliveryChannels, OrchestrationAsset, OrchestrationStatus, RequestCredentials,
};
