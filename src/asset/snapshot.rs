//! In-memory collaborators backed by an immutable JSON snapshot.
//!
//! ```json
//! {
//!   "customers": [{"id": 2, "name": "test-customer"}],
//!   "assets": [{"asset_id": "2/2/test-image", "channels": ["image"], ...}],
//!   "custom_headers": [{"customer": 2, "space": null, "role": null,
//!                       "key": "x-test", "value": "A"}]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::source::{AssetTracker, CustomHeaderStore, CustomerPathResolver};
use super::types::{AssetId, CustomHeaderRule, CustomerPathElement, OrchestrationAsset};
use crate::error::{ConfigError, LookupError, PathError};

#[derive(Debug, Clone, Deserialize)]
struct CustomerHeaderRecord {
    customer: u32,
    #[serde(flatten)]
    rule: CustomHeaderRule,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    customers: Vec<CustomerPathElement>,
    #[serde(default)]
    assets: Vec<OrchestrationAsset>,
    #[serde(default)]
    custom_headers: Vec<CustomerHeaderRecord>,
}

/// Customer, asset and header lookups over a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataStore {
    customers: Vec<CustomerPathElement>,
    assets: HashMap<AssetId, OrchestrationAsset>,
    headers: HashMap<u32, Vec<CustomHeaderRule>>,
}

impl StaticMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: display,
                source,
            },
            other => other,
        })
    }

    /// Parse and validate a snapshot document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let doc: SnapshotDocument =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;

        let mut store = Self::new();
        for customer in doc.customers {
            store = store.with_customer(customer.id, &customer.name);
        }
        for asset in doc.assets {
            asset.validate().map_err(ConfigError::Invalid)?;
            if store.assets.contains_key(&asset.asset_id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate asset {}",
                    asset.asset_id
                )));
            }
            store = store.with_asset(asset);
        }
        for record in doc.custom_headers {
            store = store.with_header(record.customer, record.rule);
        }

        debug!(
            customers = store.customers.len(),
            assets = store.assets.len(),
            "Loaded metadata snapshot"
        );
        Ok(store)
    }

    pub fn with_customer(mut self, id: u32, name: &str) -> Self {
        self.customers.push(CustomerPathElement {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_asset(mut self, asset: OrchestrationAsset) -> Self {
        self.assets.insert(asset.asset_id.clone(), asset);
        self
    }

    pub fn with_header(mut self, customer: u32, rule: CustomHeaderRule) -> Self {
        self.headers.entry(customer).or_default().push(rule);
        self
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn header_rule_count(&self) -> usize {
        self.headers.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl CustomerPathResolver for StaticMetadataStore {
    async fn resolve_customer(&self, segment: &str) -> Result<CustomerPathElement, PathError> {
        let by_id = segment.parse::<u32>().ok();
        self.customers
            .iter()
            .find(|c| c.name == segment || Some(c.id) == by_id)
            .cloned()
            .ok_or_else(|| PathError::UnknownCustomer(segment.to_string()))
    }
}

#[async_trait]
impl AssetTracker for StaticMetadataStore {
    async fn get_orchestration_asset(
        &self,
        asset_id: &AssetId,
    ) -> Result<Option<OrchestrationAsset>, LookupError> {
        Ok(self.assets.get(asset_id).cloned())
    }
}

#[async_trait]
impl CustomHeaderStore for StaticMetadataStore {
    async fn get_custom_headers(&self, customer: u32) -> Result<Vec<CustomHeaderRule>, LookupError> {
        Ok(self.headers.get(&customer).cloned().unwrap_or_default())
    }
}
