//! License gate trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::PipelineError;

/// Feature required to select express shipping.
pub const FEATURE_EXPRESS_SHIPPING: &str = "express-shipping";

/// Feature required to order 1,000 copies or more.
pub const FEATURE_BULK_ORDERS: &str = "bulk-orders";

/// Quantity at which an order counts as bulk.
pub const BULK_ORDER_THRESHOLD: u32 = 1_000;

/// Feature that grants every capability.
pub const FEATURE_ALL: &str = "all";

/// Trait for checking licensed capabilities.
#[async_trait]
pub trait LicenseGate: Send + Sync {
    /// Returns true if the license grants the named feature.
    async fn has_feature(&self, feature: &str) -> Result<bool, PipelineError>;
}

/// In-memory license gate for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLicenseGate {
    features: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryLicenseGate {
    /// Creates a gate that grants nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gate that grants every feature.
    pub fn allowing_all() -> Self {
        let gate = Self::default();
        gate.grant(FEATURE_ALL);
        gate
    }

    /// Creates a gate granting exactly the given features.
    pub fn with_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gate = Self::default();
        for feature in features {
            gate.grant(feature);
        }
        gate
    }

    /// Grants a feature.
    pub fn grant(&self, feature: impl Into<String>) {
        self.features.write().unwrap().insert(feature.into());
    }

    /// Revokes a feature.
    pub fn revoke(&self, feature: &str) {
        self.features.write().unwrap().remove(feature);
    }
}

#[async_trait]
impl LicenseGate for InMemoryLicenseGate {
    async fn has_feature(&self, feature: &str) -> Result<bool, PipelineError> {
        let features = self.features.read().unwrap();
        Ok(features.contains(FEATURE_ALL) || features.contains(feature))
    }
}
