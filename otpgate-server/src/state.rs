//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use otpgate_core::ProviderRegistry;

use crate::bindings::BindingStore;

/// Application state containing shared resources.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Configured MFA providers, in evaluation order
    pub registry: Arc<ProviderRegistry>,
    /// Per-user device bindings
    pub bindings: Arc<BindingStore>,
}

impl AppState {
    pub fn new(registry: ProviderRegistry, bindings: BindingStore) -> Self {
        Self {
            registry: Arc::new(registry),
            bindings: Arc::new(bindings),
        }
    }

    /// Build the state from the YAML configuration document.
    pub fn from_config(document: &[u8]) -> otpgate_core::Result<Self> {
        Ok(Self::new(
            ProviderRegistry::from_config(document)?,
            BindingStore::from_yaml(document)?,
        ))
    }
}
