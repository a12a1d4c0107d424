//! Application-scoped context shared across request handlers.

use std::sync::Arc;

use crate::{config::IssuerConfig, registry::DeviceRegistry};

/// Holds the device registry client plus the issuer configuration.
#[derive(Clone)]
pub struct AppContext {
    registry: Arc<dyn DeviceRegistry>,
    config: IssuerConfig,
}

impl AppContext {
    /// Construct a new context for the given registry and configuration.
    pub fn new(registry: Arc<dyn DeviceRegistry>, config: IssuerConfig) -> Self {
        Self { registry, config }
    }

    /// Borrow the registry the issuance pipeline calls into.
    pub fn registry(&self) -> &dyn DeviceRegistry {
        self.registry.as_ref()
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }
}
